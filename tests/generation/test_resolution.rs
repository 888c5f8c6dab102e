// Tests for resolving module specs against fixture crates.

use mockkit_parsers::Resolver;

use super::common::{create_crate, shop_crate};

#[test]
fn test_path_and_module_path_resolve_to_the_same_module() {
    let dir = shop_crate();
    let by_spec = Resolver::offline(dir.path()).resolve("shop::store").unwrap();
    let by_path = Resolver::offline(dir.path()).resolve("src/store.rs").unwrap();

    assert_eq!(by_spec, by_path);
    assert_eq!(by_spec.spec, "shop::store");
    assert_eq!(by_spec.module_path, vec!["store".to_string()]);
}

#[test]
fn test_resolution_is_idempotent() {
    let dir = shop_crate();
    let mut resolver = Resolver::offline(dir.path());
    let first = resolver.resolve("src/store.rs").unwrap();
    let again = resolver.resolve(&first.spec).unwrap();
    let fresh = Resolver::offline(dir.path()).resolve(&first.spec).unwrap();

    assert_eq!(first, again);
    assert_eq!(first, fresh);
}

#[test]
fn test_crate_root_and_nested_modules() {
    let dir = create_crate(
        "deep",
        &[
            ("src/lib.rs", "pub mod a;\n"),
            ("src/a/mod.rs", "pub mod b;\n"),
            ("src/a/b.rs", "pub trait T { fn f(&self); }\n"),
        ],
    );
    let mut resolver = Resolver::offline(dir.path());

    let root = resolver.resolve("deep").unwrap();
    assert!(root.is_crate_root());

    let b = resolver.resolve("deep::a::b").unwrap();
    assert_eq!(b.module_path, vec!["a".to_string(), "b".to_string()]);
    assert!(b.child_dir().ends_with("src/a/b"));
    assert!(b.same_crate(&root));
}
