// Tests for complete generation runs (resolve, parse, render, write).

use std::fs;

use mockkit_gen::{Generator, Options, Output};
use mockkit_parsers::Resolver;

use super::common::{create_crate, shop_crate};

const GOLDEN: &str = include_str!("../../crates/mockkit-gen/testdata/store_mock.golden");

fn golden_body() -> &'static str {
    let (_, body) = GOLDEN.split_once("\n---\n").unwrap();
    body
}

fn store_options() -> Options {
    Options {
        on_helpers: true,
        variadic_slices: true,
        ..Options::new("shop::store", "shop::store", "Store")
    }
}

#[test]
fn test_run_writes_the_golden_mock() {
    let dir = shop_crate();
    let mut generator = Generator::new(Resolver::offline(dir.path()));

    let output = generator.run(&store_options()).unwrap();

    let Output::File(path) = output else {
        panic!("expected a file output, got {output:?}");
    };
    assert!(path.ends_with("src/store/store_mock.rs"));
    assert_eq!(fs::read_to_string(path).unwrap(), golden_body());
}

#[test]
fn test_generation_is_deterministic() {
    let dir = shop_crate();
    let first = Generator::new(Resolver::offline(dir.path()))
        .generate(&store_options())
        .unwrap();
    let second = Generator::new(Resolver::offline(dir.path()))
        .generate(&store_options())
        .unwrap();
    assert_eq!(first.source, second.source);

    let src = &first.source;
    let order: Vec<usize> = ["fn get(", "fn put(", "fn show(", "fn pair(", "fn log(", "fn clear(", "fn name("]
        .iter()
        .map(|needle| src.find(needle).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
}

#[test]
fn test_target_module_only_changes_qualifiers() {
    let dir = shop_crate();
    let mut generator = Generator::new(Resolver::offline(dir.path()));
    let beside = generator.generate(&store_options()).unwrap();
    let above = generator
        .generate(&Options {
            dst: "shop".to_string(),
            ..store_options()
        })
        .unwrap();

    assert!(above.source.contains("use crate::store;\n"));
    assert!(!above.source.contains("use super::Store;"));

    let body = |src: &str| -> String {
        let start = src.find("impl std::fmt::Debug").unwrap();
        src[start..].replace("impl store::", "impl ")
    };
    assert_eq!(body(&beside.source), body(&above.source));
}

#[test]
fn test_batch_of_mocks_shares_one_generator() {
    let dir = create_crate(
        "clock",
        &[
            ("src/lib.rs", "pub mod time;\n"),
            (
                "src/time.rs",
                "pub trait Clock {\n    fn now(&self) -> u64;\n}\n\npub trait Timer {\n    fn fire(&self, after: u64) -> bool;\n}\n",
            ),
        ],
    );
    let mut generator = Generator::new(Resolver::offline(dir.path()));
    for name in ["Clock", "Timer"] {
        generator
            .run(&Options::new("clock::time", "clock::time", name))
            .unwrap();
    }

    let time_dir = dir.path().join("src/time");
    let clock = fs::read_to_string(time_dir.join("clock_mock.rs")).unwrap();
    let timer = fs::read_to_string(time_dir.join("timer_mock.rs")).unwrap();
    assert!(clock.contains("impl Clock for ClockMock {"));
    assert!(timer.contains("fn fire(&self, after: u64) -> bool {"));
}
