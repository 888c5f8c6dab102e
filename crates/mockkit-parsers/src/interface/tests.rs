use std::fs;

use super::*;

const STORE: &str = r#"
use std::fmt::Debug;
use crate::base::{self, Named};
use crate::model::{Error, Item};

pub trait Store: Named + base::Closer + Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Item, Error>;
    fn put(&mut self, item: Item, _: u32);
    async fn fetch<'a>(&'a self, ids: &'a [u32]) -> Vec<Item>;
    fn visit(&self, f: impl Fn(&Item) -> bool);
    fn pair(&self) -> (u32, String);
    unsafe fn raw(&self, p: *const u8) -> usize where Self: Sized;
}

pub trait Empty {}
pub trait Generic<T> { fn get(&self) -> T; }
pub trait NoSelf { fn new() -> Self; }
pub trait Borrowing { fn get(&self) -> &str; }
pub trait WithType { type Out; fn get(&self) -> u8; }
pub trait Printer: std::fmt::Display { fn print(&self); }
pub trait Marker: Named {}
pub unsafe trait Raw { fn ptr(&self) -> usize; }
pub trait Owned { fn take(self: Box<Self>) -> u8; }
pub trait Logger { fn log(&self, fmt: &str, args: &[String]); }

#[async_trait(?Send)]
pub trait Remote {
    async fn call(&self, req: String) -> u32;
}
"#;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
        let f = Self { dir };
        f.write("Cargo.toml", "[package]\nname = \"shop\"\nversion = \"0.1.0\"\n");
        f.write("src/lib.rs", "pub mod base;\npub mod model;\npub mod store;\n");
        f.write("src/model.rs", "pub struct Item;\npub struct Error;\n");
        f.write(
            "src/base.rs",
            "pub trait Named { fn name(&self) -> String; }\n\
             pub trait Closer { fn close(&mut self); fn name(&self) -> String; }\n",
        );
        f.write("src/store.rs", STORE);
        f
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn parse_with(&self, name: &str, dst: &str, opts: &ParseOptions) -> Result<Interface, GenError> {
        let mut r = Resolver::offline(self.dir.path());
        let src = r.resolve("shop::store").unwrap();
        let dst = r.resolve(dst).unwrap();
        parse_interface(&mut r, &src, &dst, name, opts)
    }

    fn parse(&self, name: &str) -> Result<Interface, GenError> {
        self.parse_with(name, "shop::store", &ParseOptions::default())
    }
}

fn names(iface: &Interface) -> Vec<&str> {
    iface.methods.iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn test_supertraits_are_expanded_depth_first() {
    let f = Fixture::new();
    let iface = f.parse("Store").unwrap();

    let traits: Vec<(&str, &str)> = iface
        .traits
        .iter()
        .map(|t| (t.name.as_str(), t.path.as_str()))
        .collect();
    assert_eq!(
        traits,
        vec![("Store", "Store"), ("Named", "base::Named"), ("Closer", "base::Closer")]
    );
    assert_eq!(
        names(&iface),
        vec!["get", "put", "fetch", "visit", "pair", "raw", "name", "close"]
    );
    assert_eq!(iface.traits[2].methods.len(), 2);

    let imports: Vec<String> = iface.imports.iter().map(|i| i.to_string()).collect();
    assert_eq!(
        imports,
        vec![
            "crate::base",
            "crate::model::Error",
            "crate::model::Item",
            "super::Store"
        ]
    );
}

#[test]
fn test_method_details() {
    let f = Fixture::new();
    let iface = f.parse("Store").unwrap();

    let get = iface.method("get").unwrap();
    assert_eq!(get.receiver, "&self");
    assert_eq!(get.params[0].name, "key");
    assert_eq!(get.params[0].capture, Capture::ToOwned);
    assert_eq!(get.returns().len(), 1);
    assert_eq!(
        get.signature(),
        "fn get(&self, key: &str) -> Result<Item, Error>"
    );
    assert_eq!(
        get.producer_type(get.returns()[0]),
        "dyn Fn(&str) -> Result<Item, Error> + Send + Sync"
    );

    let put = iface.method("put").unwrap();
    assert_eq!(put.receiver, "&mut self");
    assert_eq!(put.params[0].capture, Capture::Clone);
    assert_eq!(put.params[1].name, "_a1");
    assert!(put.params[1].anonymous);
    assert!(put.returns().is_empty());

    let fetch = iface.method("fetch").unwrap();
    assert!(fetch.is_async());
    assert_eq!(fetch.lifetimes.as_deref(), Some("<'a>"));
    assert_eq!(fetch.receiver, "&'a self");
    assert_eq!(fetch.params[0].capture, Capture::ToOwned);
    assert_eq!(
        fetch.signature(),
        "async fn fetch<'a>(&'a self, ids: &'a [u32]) -> Vec<Item>"
    );
    assert_eq!(
        fetch.producer_type(fetch.returns()[0]),
        "dyn Fn(&[u32]) -> Vec<Item> + Send + Sync"
    );

    let visit = iface.method("visit").unwrap();
    assert_eq!(visit.params[0].capture, Capture::Opaque);
    assert!(!visit.forwards());

    assert_eq!(iface.method("pair").unwrap().returns().len(), 2);

    let raw = iface.method("raw").unwrap();
    assert_eq!(raw.modifiers.as_deref(), Some("unsafe"));
    assert_eq!(raw.where_clause.as_deref(), Some("where Self: Sized"));
    assert_eq!(raw.params[0].capture, Capture::Clone);

    let close = iface.method("close").unwrap();
    assert_eq!(close.trait_path, "base::Closer");
    // Named::name comes first in the expansion order.
    assert_eq!(iface.method("name").unwrap().trait_path, "base::Named");
}

#[test]
fn test_paths_follow_the_target_module() {
    let f = Fixture::new();
    let iface = f
        .parse_with("Store", "shop", &ParseOptions::default())
        .unwrap();
    assert_eq!(iface.traits[0].path, "store::Store");
    assert!(iface.imports.contains(&Import::new("crate::store")));
}

#[test]
fn test_unsupported_traits() {
    let f = Fixture::new();
    for name in ["Generic", "NoSelf", "Borrowing", "WithType", "Printer"] {
        match f.parse(name) {
            Err(GenError::Unsupported(_)) => {}
            other => panic!("{name}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_lookup_errors() {
    let f = Fixture::new();
    assert!(matches!(f.parse("Empty"), Err(GenError::NoMethods(n)) if n == "Empty"));
    match f.parse("Missing") {
        Err(GenError::UnknownInterface { name, module }) => {
            assert_eq!(name, "Missing");
            assert_eq!(module, "shop::store");
        }
        other => panic!("unexpected {other:?}"),
    }

    let iface = f.parse("Raw").unwrap();
    assert!(matches!(
        iface.method("nope"),
        Err(GenError::UnknownMethod { method, .. }) if method == "nope"
    ));
}

#[test]
fn test_marker_trait_inherits_methods() {
    let f = Fixture::new();
    let iface = f.parse("Marker").unwrap();
    assert_eq!(iface.traits.len(), 2);
    assert!(iface.traits[0].methods.is_empty());
    assert_eq!(names(&iface), vec!["name"]);
}

#[test]
fn test_trait_flags() {
    let f = Fixture::new();
    assert!(f.parse("Raw").unwrap().traits[0].is_unsafe);
    assert!(!f.parse("Marker").unwrap().traits[0].is_unsafe);

    let remote = f.parse("Remote").unwrap();
    assert_eq!(
        remote.traits[0].attribute.as_deref(),
        Some("#[async_trait::async_trait(?Send)]")
    );
    assert!(remote.method("call").unwrap().is_async());

    let owned = f.parse("Owned").unwrap();
    assert_eq!(owned.methods[0].receiver, "self: Box<Self>");
    assert!(owned.methods[0].params.is_empty());
}

#[test]
fn test_variadic_slices_are_opt_in() {
    let f = Fixture::new();
    let plain = f.parse("Logger").unwrap();
    assert!(!plain.methods[0].variadic);
    assert!(plain.methods[0].variadic_elem().is_none());

    let opts = ParseOptions {
        variadic_slices: true,
    };
    let variadic = f.parse_with("Logger", "shop::store", &opts).unwrap();
    let log = &variadic.methods[0];
    assert!(log.variadic);
    assert_eq!(log.variadic_elem(), Some(&Ty::named("String")));
}
