// Code generated by mockkit. DO NOT EDIT.

use std::fmt::Display;
use std::sync::Arc;

use crate::model::Item;
use mockkit_core::tester;
use mockkit_mock as mock;
use super::Named;
use super::Store;

/// Mock implementation of [`Store`].
#[derive(Clone)]
pub struct StoreMock {
    pub mock: mock::Mock,
    t: Arc<dyn tester::TestingT>,
}

impl StoreMock {
    pub fn new(t: Arc<dyn tester::TestingT>) -> Self {
        Self {
            mock: mock::Mock::new(t.clone()),
            t,
        }
    }

    #[track_caller]
    pub fn on_get(&self, key: impl mock::IntoValue, n: impl mock::IntoValue) -> mock::Call {
        self.mock.on("get", mock::Arguments::from(vec![mock::IntoValue::into_value(key), mock::IntoValue::into_value(n)]))
    }

    #[track_caller]
    pub fn on_put(&self, item: impl mock::IntoValue) -> mock::Call {
        self.mock.on("put", mock::Arguments::from(vec![mock::IntoValue::into_value(item)]))
    }

    #[track_caller]
    pub fn on_show(&self, label: impl mock::IntoValue) -> mock::Call {
        self.mock.on("show", mock::Arguments::from(vec![mock::IntoValue::into_value(label)]))
    }

    #[track_caller]
    pub fn on_pair(&self, tag: impl mock::IntoValue) -> mock::Call {
        self.mock.on("pair", mock::Arguments::from(vec![mock::IntoValue::into_value(tag)]))
    }

    #[track_caller]
    pub fn on_log(&self, msg: impl mock::IntoValue, args: Vec<mock::Value>) -> mock::Call {
        let mut _args = vec![mock::IntoValue::into_value(msg)];
        _args.extend(args);
        self.mock.on("log", mock::Arguments::from(_args))
    }

    #[track_caller]
    pub fn on_clear(&self, buf: impl mock::IntoValue) -> mock::Call {
        self.mock.on("clear", mock::Arguments::from(vec![mock::IntoValue::into_value(buf)]))
    }

    #[track_caller]
    pub fn on_name(&self) -> mock::Call {
        self.mock.on("name", mock::Arguments::new())
    }
}

impl std::fmt::Debug for StoreMock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMock").finish_non_exhaustive()
    }
}

impl Store for StoreMock {
    fn get(&self, key: &str, n: u32) -> Result<Item, String> {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(2);
        _args.push(mock::capture_ref!(key, str));
        _args.push(mock::capture!(&n, u32));
        let _rets = self.mock.call("get", mock::Arguments::from(_args));
        if _rets.len() != 1 {
            self.t.fatal("the number of mocked method returns does not match");
        }
        let _r0: Result<Item, String> = match _rets.func::<dyn Fn(&str, u32) -> Result<Item, String> + Send + Sync>(0) {
            Some(_f) => _f(key, n),
            None => mock::returned!(_rets, 0, Result<Item, String>).unwrap_or_else(|e| self.t.fatal(&e)),
        };
        _r0
    }

    fn put(&mut self, item: Item) {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(1);
        _args.push(mock::capture!(&item, Item));
        self.mock.call("put", mock::Arguments::from(_args));
    }

    #[allow(unused_variables)]
    fn show(&self, label: impl Display) -> usize {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(1);
        _args.push(mock::Value::opaque("impl Display"));
        let _rets = self.mock.call("show", mock::Arguments::from(_args));
        if _rets.len() != 1 {
            self.t.fatal("the number of mocked method returns does not match");
        }
        let _r0: usize = mock::returned!(_rets, 0, usize).unwrap_or_else(|e| self.t.fatal(&e));
        _r0
    }

    fn pair(&self, tag: String) -> (u32, String) {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(1);
        _args.push(mock::capture!(&tag, String));
        let _rets = self.mock.call("pair", mock::Arguments::from(_args));
        if _rets.len() != 2 {
            self.t.fatal("the number of mocked method returns does not match");
        }
        let _r0: u32 = match (
            _rets.func::<dyn Fn(String) -> u32 + Send + Sync>(0),
            mock::try_clone!(&tag, String),
        ) {
            (Some(_f), Some(tag)) => _f(tag),
            _ => mock::returned!(_rets, 0, u32).unwrap_or_else(|e| self.t.fatal(&e)),
        };
        let _r1: String = match (
            _rets.func::<dyn Fn(String) -> String + Send + Sync>(1),
            mock::try_clone!(&tag, String),
        ) {
            (Some(_f), Some(tag)) => _f(tag),
            _ => mock::returned!(_rets, 1, String).unwrap_or_else(|e| self.t.fatal(&e)),
        };
        (_r0, _r1)
    }

    fn log(&self, msg: &str, args: &[String]) {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(1 + args.len());
        _args.push(mock::capture_ref!(msg, str));
        for _v in args.iter() {
            _args.push(mock::capture!(_v, String));
        }
        self.mock.call("log", mock::Arguments::from(_args));
    }

    fn clear(&mut self, buf: &mut Vec<u8>) {
        self.t.helper();
        let mut _args: Vec<mock::Value> = Vec::with_capacity(1);
        _args.push(mock::capture_ref!(&*buf, Vec<u8>));
        self.mock.call("clear", mock::Arguments::from(_args));
    }
}

impl Named for StoreMock {
    fn name(&self) -> String {
        self.t.helper();
        let _rets = self.mock.call("name", mock::Arguments::new());
        if _rets.len() != 1 {
            self.t.fatal("the number of mocked method returns does not match");
        }
        let _r0: String = match _rets.func::<dyn Fn() -> String + Send + Sync>(0) {
            Some(_f) => _f(),
            None => mock::returned!(_rets, 0, String).unwrap_or_else(|e| self.t.fatal(&e)),
        };
        _r0
    }
}
