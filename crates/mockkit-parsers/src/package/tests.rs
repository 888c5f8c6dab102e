use std::fs;

use super::*;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn shop() -> Self {
        let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
        let f = Self { dir };
        f.write("Cargo.toml", "[package]\nname = \"shop\"\nversion = \"0.1.0\"\n");
        f.write(
            "src/lib.rs",
            "pub mod store;\n#[path = \"gen/api.rs\"]\npub mod api;\n",
        );
        f.write("src/store.rs", "pub mod backend;\npub struct Item;\n");
        f.write("src/store/backend.rs", "pub trait Backend {}\n");
        f.write("src/gen/api.rs", "pub struct Api;\n");
        f
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel).canonicalize().unwrap()
    }

    fn resolver(&self) -> Resolver {
        Resolver::offline(self.dir.path())
    }
}

#[test]
fn test_resolve_crate_root() {
    let f = Fixture::shop();
    let pkg = f.resolver().resolve("shop").unwrap();
    assert_eq!(pkg.spec, "shop");
    assert_eq!(pkg.ident, "shop");
    assert_eq!(pkg.crate_name, "shop");
    assert!(pkg.is_crate_root());
    assert_eq!(pkg.file, f.path("src/lib.rs"));
    assert_eq!(pkg.dir, f.path("src"));
}

#[test]
fn test_resolve_nested_module() {
    let f = Fixture::shop();
    let pkg = f.resolver().resolve("shop::store::backend").unwrap();
    assert_eq!(pkg.spec, "shop::store::backend");
    assert_eq!(pkg.ident, "backend");
    assert_eq!(pkg.module_path, vec!["store", "backend"]);
    assert_eq!(pkg.file, f.path("src/store/backend.rs"));
}

#[test]
fn test_resolve_path_attribute_module() {
    let f = Fixture::shop();
    let pkg = f.resolver().resolve("shop::api").unwrap();
    assert_eq!(pkg.file, f.path("src/gen/api.rs"));
}

#[test]
fn test_resolve_file_path() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    let by_file = r.resolve("src/store.rs").unwrap();
    assert_eq!(by_file.spec, "shop::store");
    let by_dir = r.resolve("src/store").unwrap();
    assert_eq!(by_dir, by_file);
    let nested = r.resolve("src/store/backend.rs").unwrap();
    assert_eq!(nested.spec, "shop::store::backend");
}

#[test]
fn test_resolve_package_dir() {
    let f = Fixture::shop();
    let pkg = f.resolver().resolve(".").unwrap();
    assert_eq!(pkg.spec, "shop");
}

#[test]
fn test_resolve_crate_keyword() {
    let f = Fixture::shop();
    let pkg = f.resolver().resolve("crate::store").unwrap();
    assert_eq!(pkg.spec, "shop::store");
}

#[test]
fn test_resolution_is_idempotent() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    let first = r.resolve("shop::store").unwrap();
    let second = r.resolve("shop::store").unwrap();
    assert_eq!(first, second);

    let fresh = f.resolver().resolve("shop::store").unwrap();
    assert_eq!(first, fresh);
}

#[test]
fn test_invalid_specs() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    for spec in ["shop::", "a b", "self::store", "shop::super", "9lives", ""] {
        match r.resolve(spec) {
            Err(GenError::InvalidImportSpec(s)) => assert_eq!(s, spec),
            other => panic!("{spec:?}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_unknown_packages() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    assert!(matches!(
        r.resolve("nope::x"),
        Err(GenError::UnknownPackage { .. })
    ));
    assert!(matches!(
        r.resolve("shop::missing"),
        Err(GenError::UnknownPackage { .. })
    ));
}

#[test]
fn test_file_outside_any_package() {
    let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
    fs::write(dir.path().join("loose.rs"), "pub trait T {}").unwrap();
    let mut r = Resolver::offline(dir.path());
    assert!(matches!(r.resolve("loose.rs"), Err(GenError::NotInModule(_))));
}

#[test]
fn test_path_from() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    let store = r.resolve("shop::store").unwrap();
    let root = r.resolve("shop").unwrap();
    assert_eq!(store.path_from(&root), "crate::store");

    let mut other = root.clone();
    other.crate_name = "app".to_string();
    assert_eq!(store.path_from(&other), "shop::store");
    assert_eq!(store.child_dir(), f.path("src/store"));
}

#[test]
fn test_module_in_walks_from_crate_root() {
    let f = Fixture::shop();
    let mut r = f.resolver();
    let store = r.resolve("shop::store").unwrap();
    let backend = r
        .module_in(&store, &["store".to_string(), "backend".to_string()])
        .unwrap();
    assert_eq!(backend.spec, "shop::store::backend");
    assert_eq!(backend.file, f.path("src/store/backend.rs"));
    assert_eq!(backend.crate_root, f.path("src/lib.rs"));

    let root = r.module_in(&store, &[]).unwrap();
    assert!(root.is_crate_root());
    assert!(r.module_in(&store, &["nope".to_string()]).is_err());
}

#[test]
fn test_is_identifier() {
    assert!(is_identifier("store"));
    assert!(is_identifier("_private"));
    assert!(is_identifier("r#type"));
    assert!(!is_identifier("_"));
    assert!(!is_identifier("a-b"));
    assert!(!is_identifier(""));
}
