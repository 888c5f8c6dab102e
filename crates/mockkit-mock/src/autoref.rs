//! Capture and extraction helpers used by generated mocks.
//!
//! Generated code knows argument and return types only by name. These
//! macros pick the best available behaviour for a concrete type at compile
//! time. An argument that is `PartialEq` is recorded so that it compares with
//! it, one that is only `Clone + Debug` compares by `Debug` output, anything
//! else becomes an opaque placeholder. A nil return gives the `Default` of the
//! return type, a `Clone` return type is extracted from the configured
//! returns, anything else reports that a return producer is needed.
//!
//! The selection relies on method resolution trying `&&Slot<T>`, then
//! `&Slot<T>`, then `Slot<T>` when called on `&&&Slot<T>` (and `Slot<T>`
//! before `&Slot<T>` when called on `&Slot<T>`).

use std::any::{type_name, Any};
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::arguments::Arguments;
use crate::value::{short_type_name, Value};

/// Wraps a value, keeping its `PartialEq` when it has one.
///
/// ```
/// use std::collections::HashMap;
/// use mockkit_mock::value;
///
/// let a: HashMap<u8, u8> = (0..16).map(|i| (i, i)).collect();
/// let b: HashMap<u8, u8> = (0..16).rev().map(|i| (i, i)).collect();
/// assert!(value!(a).deep_equal(&value!(b)));
/// ```
#[macro_export]
macro_rules! value {
    ($v:expr) => {{
        #[allow(unused_imports)]
        use $crate::autoref::{WrapDebug as _, WrapEq as _};
        let v = $v;
        (&$crate::autoref::Slot::of(&v)).wrap(v)
    }};
}

/// Records a reference to an owned argument.
///
/// ```
/// use mockkit_mock::capture;
///
/// struct NoDebug;
///
/// let n = 5_i32;
/// assert_eq!(capture!(&n, i32).render(), "(i32=5)");
/// assert_eq!(capture!(&NoDebug, NoDebug).render(), "(NoDebug=NoDebug)");
/// ```
#[macro_export]
macro_rules! capture {
    ($v:expr, $t:ty) => {{
        #[allow(unused_imports)]
        use $crate::autoref::{CaptureEq as _, CaptureOpaque as _, CaptureValue as _};
        (&&&$crate::autoref::Slot::<$t>::new()).capture($v)
    }};
}

/// Records a borrowed argument by its owned form (`&str` as `String`,
/// `&[T]` as `Vec<T>`).
#[macro_export]
macro_rules! capture_ref {
    ($v:expr, $t:ty) => {{
        #[allow(unused_imports)]
        use $crate::autoref::{CaptureOpaqueRef as _, CaptureOwned as _, CaptureOwnedEq as _};
        (&&&$crate::autoref::Slot::<$t>::new()).capture_ref($v)
    }};
}

/// Extracts return value `$i` of type `$t` from an [`Arguments`].
#[macro_export]
macro_rules! returned {
    ($rets:expr, $i:expr, $t:ty) => {{
        #[allow(unused_imports)]
        use $crate::autoref::{ExtractClone as _, ExtractDefault as _, ExtractOnce as _};
        (&&&$crate::autoref::Slot::<$t>::new()).extract(&$rets, $i)
    }};
}

/// Clones an argument for a return producer, `None` when the type is not
/// `Clone`.
#[macro_export]
macro_rules! try_clone {
    ($v:expr, $t:ty) => {{
        #[allow(unused_imports)]
        use $crate::autoref::{CloneNone as _, CloneSome as _};
        (&$crate::autoref::Slot::<$t>::new()).try_clone($v)
    }};
}

/// Type carrier the helper traits are implemented on.
pub struct Slot<T: ?Sized>(PhantomData<T>);

impl<T: ?Sized> Slot<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Slot(PhantomData)
    }
}

impl<T> Slot<T> {
    /// A slot for the type of `_v`.
    pub fn of(_v: &T) -> Self {
        Slot(PhantomData)
    }
}

fn opaque<T: ?Sized>() -> Value {
    Value::opaque(short_type_name(type_name::<T>()))
}

pub trait WrapEq<T> {
    fn wrap(&self, v: T) -> Value;
}

impl<T: Any + Debug + Send + Sync + PartialEq> WrapEq<T> for Slot<T> {
    fn wrap(&self, v: T) -> Value {
        Value::comparable(v)
    }
}

pub trait WrapDebug<T> {
    fn wrap(&self, v: T) -> Value;
}

impl<T: Any + Debug + Send + Sync> WrapDebug<T> for &Slot<T> {
    fn wrap(&self, v: T) -> Value {
        Value::new(v)
    }
}

pub trait CaptureEq<T> {
    fn capture(&self, v: &T) -> Value;
}

impl<T: Any + Clone + Debug + Send + Sync + PartialEq> CaptureEq<T> for &&Slot<T> {
    fn capture(&self, v: &T) -> Value {
        Value::comparable(v.clone())
    }
}

pub trait CaptureValue<T> {
    fn capture(&self, v: &T) -> Value;
}

impl<T: Any + Clone + Debug + Send + Sync> CaptureValue<T> for &Slot<T> {
    fn capture(&self, v: &T) -> Value {
        Value::new(v.clone())
    }
}

pub trait CaptureOpaque<T> {
    fn capture(&self, v: &T) -> Value;
}

impl<T> CaptureOpaque<T> for Slot<T> {
    fn capture(&self, _: &T) -> Value {
        opaque::<T>()
    }
}

pub trait CaptureOwnedEq<T: ?Sized> {
    fn capture_ref(&self, v: &T) -> Value;
}

impl<T> CaptureOwnedEq<T> for &&Slot<T>
where
    T: ToOwned + ?Sized,
    T::Owned: Any + Debug + Send + Sync + PartialEq,
{
    fn capture_ref(&self, v: &T) -> Value {
        Value::comparable(v.to_owned())
    }
}

pub trait CaptureOwned<T: ?Sized> {
    fn capture_ref(&self, v: &T) -> Value;
}

impl<T> CaptureOwned<T> for &Slot<T>
where
    T: ToOwned + ?Sized,
    T::Owned: Any + Debug + Send + Sync,
{
    fn capture_ref(&self, v: &T) -> Value {
        Value::new(v.to_owned())
    }
}

pub trait CaptureOpaqueRef<T: ?Sized> {
    fn capture_ref(&self, v: &T) -> Value;
}

impl<T: ?Sized> CaptureOpaqueRef<T> for Slot<T> {
    fn capture_ref(&self, _: &T) -> Value {
        opaque::<T>()
    }
}

pub trait ExtractDefault<T> {
    fn extract(&self, rets: &Arguments, i: usize) -> Result<T, String>;
}

impl<T: Any + Clone + Default> ExtractDefault<T> for &&Slot<T> {
    fn extract(&self, rets: &Arguments, i: usize) -> Result<T, String> {
        match rets.values().get(i) {
            Some(Value::Nil) => Ok(T::default()),
            _ => rets.returned::<T>(i),
        }
    }
}

pub trait ExtractClone<T> {
    fn extract(&self, rets: &Arguments, i: usize) -> Result<T, String>;
}

impl<T: Any + Clone> ExtractClone<T> for &Slot<T> {
    fn extract(&self, rets: &Arguments, i: usize) -> Result<T, String> {
        rets.returned::<T>(i)
    }
}

pub trait ExtractOnce<T> {
    fn extract(&self, rets: &Arguments, i: usize) -> Result<T, String>;
}

impl<T> ExtractOnce<T> for Slot<T> {
    fn extract(&self, _: &Arguments, i: usize) -> Result<T, String> {
        Err(format!(
            "[mock] return value {i} of type \"{}\" cannot be cloned, return a function producing it",
            short_type_name(type_name::<T>())
        ))
    }
}

pub trait CloneSome<T> {
    fn try_clone(&self, v: &T) -> Option<T>;
}

impl<T: Clone> CloneSome<T> for Slot<T> {
    fn try_clone(&self, v: &T) -> Option<T> {
        Some(v.clone())
    }
}

pub trait CloneNone<T> {
    fn try_clone(&self, v: &T) -> Option<T>;
}

impl<T> CloneNone<T> for &Slot<T> {
    fn try_clone(&self, _: &T) -> Option<T> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::args;
    use crate::value::Value;

    #[derive(Debug, Clone, PartialEq)]
    struct Point(i32, i32);

    #[derive(Debug)]
    struct Handle;

    struct Unprintable;

    #[test]
    fn test_capture_clones_debug_values() {
        let p = Point(1, 2);
        let v = capture!(&p, Point);
        assert_eq!(v.downcast_ref::<Point>(), Some(&Point(1, 2)));
    }

    #[test]
    fn test_capture_falls_back_to_opaque() {
        let v = capture!(&Unprintable, Unprintable);
        assert_eq!(v.render(), "(Unprintable=Unprintable)");
        let v = capture!(&Handle, Handle);
        assert_eq!(v.render(), "(Handle=Handle)");
    }

    #[test]
    fn test_capture_ref_owns_borrowed_values() {
        let s: &str = "abc";
        let v = capture_ref!(s, str);
        assert_eq!(v.downcast_ref::<String>().map(String::as_str), Some("abc"));

        let xs: &[i32] = &[1, 2];
        let v = capture_ref!(xs, [i32]);
        assert_eq!(v.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2]));

        let u = Unprintable;
        let v = capture_ref!(&u, Unprintable);
        assert_eq!(v.render(), "(Unprintable=Unprintable)");
    }

    #[test]
    fn test_returned_extracts_clone_types() {
        let rets = args![Point(3, 4), "x"];
        assert_eq!(returned!(rets, 0, Point), Ok(Point(3, 4)));
        assert_eq!(returned!(rets, 1, String), Ok("x".to_string()));
        assert!(returned!(rets, 0, String).is_err());
    }

    #[test]
    fn test_returned_rejects_non_clone_types() {
        let rets = args![Handle];
        let err = returned!(rets, 0, Handle).err().unwrap();
        assert_eq!(
            err,
            "[mock] return value 0 of type \"Handle\" cannot be cloned, return a function producing it"
        );
    }

    #[test]
    fn test_nil_return_gives_the_default() {
        let rets = args![Value::Nil, Value::Nil, Value::Nil];
        assert_eq!(returned!(rets, 0, Option<String>), Ok(None));
        assert_eq!(returned!(rets, 1, Vec<u8>), Ok(Vec::new()));
        assert_eq!(returned!(rets, 2, u32), Ok(0));
        assert!(returned!(rets, 0, Value).unwrap().is_nil());

        // Without a Default the nil stays an error.
        let err = returned!(rets, 0, Point).err().unwrap();
        assert_eq!(err, "[mock] return value 0 is nil, want Point");
    }

    #[test]
    fn test_captured_values_compare_with_partial_eq() {
        let a: HashMap<String, u32> = (0..8).map(|i| (i.to_string(), i)).collect();
        let b: HashMap<String, u32> = (0..8).rev().map(|i| (i.to_string(), i)).collect();
        assert!(capture!(&a, HashMap<String, u32>).deep_equal(&args![b.clone()].values()[0]));
        assert!(value!(a.clone()).deep_equal(&value!(b)));

        let xs: &[f64] = &[0.0];
        assert!(capture_ref!(xs, [f64]).deep_equal(&value!(vec![-0.0_f64])));
    }

    #[test]
    fn test_try_clone() {
        assert_eq!(try_clone!(&Point(1, 1), Point), Some(Point(1, 1)));
        assert!(try_clone!(&Handle, Handle).is_none());
    }
}
