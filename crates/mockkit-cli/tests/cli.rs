// Exit codes and output of the mockkit binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const STORE: &str = r#"
use crate::model::Item;

pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<Item>;
    fn put(&mut self, item: Item);
}
"#;

fn shop_crate() -> TempDir {
    let dir = tempfile::Builder::new().prefix("mockkit-cli").tempdir().unwrap();
    let files = [
        (
            "Cargo.toml",
            "[package]\nname = \"shop\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
        ),
        ("src/lib.rs", "pub mod model;\npub mod store;\n"),
        ("src/model.rs", "#[derive(Debug, Clone, PartialEq)]\npub struct Item { pub id: u32 }\n"),
        ("src/store.rs", STORE),
    ];
    for (rel, content) in files {
        write(dir.path(), rel, content);
    }
    dir
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn mockkit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mockkit"))
        .args(args)
        .current_dir(dir)
        .env_remove("MOCKKIT_TESTER_ALIAS")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mockkit")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn gen_writes_the_mock_and_prints_its_path() {
    let dir = shop_crate();
    let out = mockkit(
        dir.path(),
        &["gen", "--src", "shop::store", "--dst", "shop::store", "--trait", "Store"],
    );

    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let printed = stdout(&out);
    assert!(printed.trim_end().ends_with("store_mock.rs"), "{printed}");
    let written = fs::read_to_string(dir.path().join("src/store/store_mock.rs")).unwrap();
    assert!(written.starts_with("// Code generated by mockkit. DO NOT EDIT."));
    assert!(written.contains("pub struct StoreMock"));
}

#[test]
fn gen_to_stdout_writes_no_file() {
    let dir = shop_crate();
    let out = mockkit(
        dir.path(),
        &[
            "gen", "--src", "src/store.rs", "--dst", "src/store.rs", "--trait", "Store",
            "--name", "FakeStore", "-o", "-",
        ],
    );

    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert!(stdout(&out).contains("pub struct FakeStore"));
    assert!(!dir.path().join("src/store").exists());
}

#[test]
fn gen_unknown_trait_exits_with_failure() {
    let dir = shop_crate();
    let out = mockkit(
        dir.path(),
        &["gen", "--src", "shop::store", "--dst", "shop::store", "--trait", "Missing"],
    );

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("mockkit gen:"), "{err}");
    assert!(err.contains("unknown trait Missing"), "{err}");
    assert!(stdout(&out).is_empty());
}

#[test]
fn gen_unknown_module_exits_with_failure() {
    let dir = shop_crate();
    let out = mockkit(
        dir.path(),
        &["gen", "--src", "shop::nowhere", "--dst", "shop::store", "--trait", "Store"],
    );

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown package shop::nowhere"));
}

#[test]
fn gen_without_trait_is_a_usage_error() {
    let dir = shop_crate();
    let out = mockkit(dir.path(), &["gen", "--src", "shop::store", "--dst", "shop::store"]);

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--trait"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let dir = shop_crate();
    let out = mockkit(dir.path(), &["mock"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn batch_generates_every_listed_mock() {
    let dir = shop_crate();
    write(
        dir.path(),
        "mockkit.json",
        r#"{"mocks": [{"src": "shop::store", "dst": "shop::store", "trait": "Store"}]}"#,
    );

    let out = mockkit(dir.path(), &["batch"]);

    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert!(dir.path().join("src/store/store_mock.rs").is_file());
}

#[test]
fn batch_with_a_failing_entry_exits_with_failure() {
    let dir = shop_crate();
    write(
        dir.path(),
        "mocks.json",
        r#"{"mocks": [
            {"src": "shop::store", "dst": "shop::store", "trait": "Store"},
            {"src": "shop::store", "dst": "shop::store", "trait": "Missing"}
        ]}"#,
    );

    let out = mockkit(dir.path(), &["batch", "--config", "mocks.json"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("1 mock(s) failed"));
    assert!(dir.path().join("src/store/store_mock.rs").is_file());
}

#[test]
fn batch_without_config_exits_with_failure() {
    let dir = shop_crate();
    let out = mockkit(dir.path(), &["batch"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("mockkit batch:"));
}
