// Tests driving the generated StoreMock through the runtime.

use std::sync::Arc;

use mockkit_core::spy::Spy;
use mockkit_mock::{args, Value, ANY};

use crate::model::Item;
use crate::store_mock::StoreMock;
use crate::{Named, Store};

fn setup() -> (Spy, StoreMock) {
    let spy = Spy::new();
    let store = StoreMock::new(spy.t());
    (spy, store)
}

fn finish(spy: &Spy) {
    spy.close();
    let mismatches = spy.verify();
    assert!(mismatches.is_empty(), "{mismatches:?}");
}

fn describe(s: &impl Store) -> String {
    format!("store {}", s.name())
}

#[test]
fn test_configured_return_value() {
    let (spy, store) = setup();
    store
        .on_get("apple".to_string(), 2_u32)
        .returns(args![Ok::<Item, String>(Item { id: 7 })]);
    store
        .on_get(ANY, ANY)
        .returns(args![Err::<Item, String>("missing".to_string())]);

    assert_eq!(store.get("apple", 2), Ok(Item { id: 7 }));
    assert_eq!(store.get("pear", 1), Err("missing".to_string()));
    finish(&spy);
}

#[test]
fn test_return_producer_receives_arguments() {
    let (spy, store) = setup();
    let produce = Value::func::<dyn Fn(&str, u32) -> Result<Item, String> + Send + Sync>(
        Arc::new(|key: &str, n: u32| Ok(Item { id: key.len() as u32 * n })),
    );
    store.on_get(ANY, ANY).returns(args![produce]);

    assert_eq!(store.get("abc", 2), Ok(Item { id: 6 }));
    assert_eq!(store.get("abcd", 3), Ok(Item { id: 12 }));
    finish(&spy);
}

#[test]
fn test_owned_argument_is_recorded() {
    let (spy, mut store) = setup();
    store.on_put(Item { id: 3 }).once();

    store.put(Item { id: 3 });

    let calls = store.mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "put");
    assert_eq!(calls[0].args.get(0).downcast_ref::<Item>(), Some(&Item { id: 3 }));
    finish(&spy);
}

#[test]
fn test_nil_returns_give_defaults() {
    let (spy, store) = setup();
    store.on_pair(ANY).returns(args![Value::Nil, Value::Nil]);
    store.on_name().returns(args![Value::Nil]);

    assert_eq!(store.pair("abc".to_string()), (0, String::new()));
    assert_eq!(store.name(), "");
    finish(&spy);
}

#[test]
fn test_tuple_return_with_producer_and_value() {
    let (spy, store) = setup();
    let len = Value::func::<dyn Fn(String) -> u32 + Send + Sync>(Arc::new(|tag: String| {
        tag.len() as u32
    }));
    store.on_pair(ANY).returns(args![len, "fixed".to_string()]);

    assert_eq!(store.pair("abcd".to_string()), (4, "fixed".to_string()));
    finish(&spy);
}

#[test]
fn test_variadic_arguments_are_flattened() {
    let (spy, store) = setup();
    store
        .on_log(
            "start".to_string(),
            vec![Value::new("a"), Value::new("b")],
        )
        .once();

    store.log("start", &["a".to_string(), "b".to_string()]);

    let calls = store.mock.calls();
    assert_eq!(calls[0].args.len(), 3);
    assert_eq!(calls[0].args.string(2), "b");
    finish(&spy);
}

#[test]
fn test_opaque_argument_matches_its_placeholder() {
    let (spy, store) = setup();
    store
        .on_show(Value::opaque("impl Display"))
        .returns(args![5_usize]);

    assert_eq!(store.show(42), 5);
    assert_eq!(store.show("label"), 5);
    finish(&spy);
}

#[test]
fn test_mutable_reference_argument() {
    let (spy, mut store) = setup();
    store.on_clear(vec![1_u8, 2]).once();

    let mut buf = vec![1_u8, 2];
    store.clear(&mut buf);
    assert_eq!(buf, vec![1, 2]);
    finish(&spy);
}

#[test]
fn test_supertrait_method() {
    let (spy, store) = setup();
    store.on_name().returns(args!["main".to_string()]);

    assert_eq!(describe(&store), "store main");
    finish(&spy);
}

#[test]
fn test_return_count_mismatch_is_fatal() {
    let (spy, store) = setup();
    store.on_name().returns(args!["a".to_string(), 2]);

    assert!(spy.catch(|| store.name()).is_none());
    let fatals = spy.fatals();
    assert_eq!(fatals.len(), 1);
    assert!(fatals[0].contains("the number of mocked method returns does not match"));
}

#[test]
fn test_wrong_return_type_is_fatal() {
    let (spy, store) = setup();
    store.on_name().returns(args![5]);

    assert!(spy.catch(|| store.name()).is_none());
    let fatals = spy.fatals();
    assert_eq!(fatals.len(), 1);
    assert!(fatals[0].contains("not \"String\""), "{fatals:?}");
}

#[test]
fn test_unexpected_call_is_fatal() {
    let (spy, store) = setup();
    store.on_get("apple".to_string(), 1_u32).returns(args![Ok::<Item, String>(Item { id: 1 })]);

    assert!(spy.catch(|| store.get("pear", 1)).is_none());
    assert!(spy.fatals()[0].contains("[mock] unexpected method call"));
}

#[test]
fn test_audit_reports_uncalled_expectations() {
    let (spy, store) = setup();
    store.on_put(Item { id: 1 }).once();
    store.on_name().returns(args!["unused".to_string()]).optional();

    spy.close();
    let errors = spy.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("[mock] too few method calls"));
    assert!(errors[0].contains("put(Item)"));
}
