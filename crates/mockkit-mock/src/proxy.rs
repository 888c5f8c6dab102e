//! Proxy-backed behaviour: a typed function called with the actual arguments.

use std::any::{type_name, Any};
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::value::{short_type_name, take, Value};

type Erased = Arc<dyn Fn(&Arguments) -> Arguments + Send + Sync>;

/// A function standing in for a method.
///
/// The method name is taken from the function item's path, so
/// `Proxy::new(lookup)` answers calls to `lookup`. Closures have no usable
/// path and must be named with [`Proxy::named`].
///
/// Return values follow the function's return type: `()` returns nothing,
/// [`Arguments`] is returned as is, and any other value is returned as a
/// single position.
#[derive(Clone)]
pub struct Proxy {
    name: Option<String>,
    params: Vec<String>,
    variadic: bool,
    f: Erased,
}

impl Proxy {
    /// Wraps a function taking up to six owned arguments.
    pub fn new<A, F: ProxyFn<A>>(f: F) -> Self {
        Self {
            name: method_name(type_name::<F>()),
            params: F::params(),
            variadic: false,
            f: Arc::new(move |args: &Arguments| f.invoke(args)),
        }
    }

    /// Wraps a function whose last parameter is a `Vec<T>` collecting every
    /// remaining argument.
    ///
    /// ```
    /// use mockkit_mock::{args, Proxy};
    ///
    /// fn join(sep: String, parts: Vec<String>) -> String {
    ///     parts.join(&sep)
    /// }
    ///
    /// let p = Proxy::variadic(join);
    /// assert_eq!(p.signature(), "join(String, ...String)");
    /// assert_eq!(p.call(&args!["-", "a", "b"]).string(0), "a-b");
    /// ```
    pub fn variadic<A, F: VariadicFn<A>>(f: F) -> Self {
        Self {
            name: method_name(type_name::<F>()),
            params: F::params(),
            variadic: true,
            f: Arc::new(move |args: &Arguments| f.invoke(args)),
        }
    }

    /// Sets the method name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `name(T1, T2, ...Rest)`.
    pub fn signature(&self) -> String {
        let mut params = self.params.clone();
        if self.variadic {
            if let Some(rest) = params.last_mut() {
                *rest = format!("...{rest}");
            }
        }
        format!(
            "{}({})",
            self.name.as_deref().unwrap_or("<unnamed>"),
            params.join(", ")
        )
    }

    /// Calls the function. Panics raised by the function propagate.
    pub fn call(&self, args: &Arguments) -> Arguments {
        (self.f)(args)
    }
}

impl Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proxy({})", self.signature())
    }
}

/// Last path segment of a function item's type name.
fn method_name(full: &str) -> Option<String> {
    if full.contains("{{closure}}") || full.starts_with("fn(") || full.contains('(') {
        return None;
    }
    full.rsplit("::").next().map(str::to_string)
}

/// Converts a proxy's return value into a return list.
fn into_returns<R: Any + Debug + Send + Sync>(r: R) -> Arguments {
    let mut slot = Some(r);
    if let Some(a) = take::<Arguments, R>(&mut slot) {
        return a;
    }
    if take::<(), R>(&mut slot).is_some() {
        return Arguments::new();
    }
    slot.into_iter().map(Value::new).collect()
}

#[track_caller]
fn arg<A: Any + Clone>(args: &Arguments, i: usize) -> A {
    let v = args.get(i);
    if let Some(a) = (v as &dyn Any).downcast_ref::<A>() {
        return a.clone();
    }
    match v.downcast_ref::<A>() {
        Some(a) => a.clone(),
        None => panic!(
            "[mock] proxy: argument {i} is of type \"{}\" not \"{}\"",
            v.type_name(),
            short_type_name(type_name::<A>())
        ),
    }
}

#[track_caller]
fn check_len(args: &Arguments, want: usize, variadic: bool) {
    let ok = if variadic {
        args.len() >= want
    } else {
        args.len() == want
    };
    if !ok {
        panic!(
            "[mock] proxy: want {}{want} arguments have {}",
            if variadic { "at least " } else { "" },
            args.len()
        );
    }
}

/// Functions usable with [`Proxy::new`]. `A` is the tuple of parameter
/// types.
pub trait ProxyFn<A>: Send + Sync + 'static {
    fn params() -> Vec<String>;
    fn invoke(&self, args: &Arguments) -> Arguments;
}

/// Functions usable with [`Proxy::variadic`]. `A` is the tuple of parameter
/// types, ending with the `Vec<T>` rest parameter.
pub trait VariadicFn<A>: Send + Sync + 'static {
    fn params() -> Vec<String>;
    fn invoke(&self, args: &Arguments) -> Arguments;
}

macro_rules! impl_proxy_fn {
    ($($ty:ident),*) => {
        impl<Func, Ret, $($ty,)*> ProxyFn<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Ret + Send + Sync + 'static,
            Ret: Any + Debug + Send + Sync,
            $($ty: Any + Clone,)*
        {
            fn params() -> Vec<String> {
                vec![$(short_type_name(type_name::<$ty>())),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: &Arguments) -> Arguments {
                let mut next = 0usize;
                $(
                    let $ty = arg::<$ty>(args, next);
                    next += 1;
                )*
                check_len(args, next, false);
                into_returns(self($($ty),*))
            }
        }

        impl<Func, Ret, $($ty,)* Rest> VariadicFn<($($ty,)* Vec<Rest>,)> for Func
        where
            Func: Fn($($ty,)* Vec<Rest>) -> Ret + Send + Sync + 'static,
            Ret: Any + Debug + Send + Sync,
            $($ty: Any + Clone,)*
            Rest: Any + Clone,
        {
            fn params() -> Vec<String> {
                vec![$(short_type_name(type_name::<$ty>()),)* short_type_name(type_name::<Rest>())]
            }

            #[allow(non_snake_case, unused_mut)]
            fn invoke(&self, args: &Arguments) -> Arguments {
                let mut next = 0usize;
                $(
                    let $ty = arg::<$ty>(args, next);
                    next += 1;
                )*
                check_len(args, next, true);
                let rest = (next..args.len()).map(|i| arg::<Rest>(args, i)).collect();
                into_returns(self($($ty,)* rest))
            }
        }
    };
}

impl_proxy_fn!();
impl_proxy_fn!(A0);
impl_proxy_fn!(A0, A1);
impl_proxy_fn!(A0, A1, A2);
impl_proxy_fn!(A0, A1, A2, A3);
impl_proxy_fn!(A0, A1, A2, A3, A4);
impl_proxy_fn!(A0, A1, A2, A3, A4, A5);
