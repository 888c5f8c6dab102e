/// Shared helpers for the mockkit integration tests.
///
/// Import from any integration test file with:
///   `#[path = "common/mod.rs"] mod common;`
use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub const SHOP_STORE: &str = r#"
use std::fmt::Display;

use crate::model::Item;

pub trait Named {
    fn name(&self) -> String;
}

pub trait Store: Named + Send + Sync {
    fn get(&self, key: &str, n: u32) -> Result<Item, String>;
    fn put(&mut self, item: Item);
    fn show(&self, label: impl Display) -> usize;
    fn pair(&self, tag: String) -> (u32, String);
    fn log(&self, msg: &str, args: &[String]);
    fn clear(&mut self, buf: &mut Vec<u8>);
}
"#;

/// Creates a crate named `name` holding `files`, paths relative to the
/// manifest directory.
///
/// Hold the returned TempDir to keep the directory alive.
pub fn create_crate(name: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
    write(
        dir.path(),
        "Cargo.toml",
        &format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n"),
    );
    for (path, content) in files {
        write(dir.path(), path, content);
    }
    dir
}

/// The `shop` crate: a `model` module with `Item` and a `store` module with
/// the `Named` and `Store` traits.
#[allow(dead_code)]
pub fn shop_crate() -> TempDir {
    create_crate(
        "shop",
        &[
            ("src/lib.rs", "pub mod model;\npub mod store;\n"),
            (
                "src/model.rs",
                "#[derive(Debug, Clone, PartialEq)]\npub struct Item { pub id: u32 }\n",
            ),
            ("src/store.rs", SHOP_STORE),
        ],
    )
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
