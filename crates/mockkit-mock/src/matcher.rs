//! Matchers for expected arguments that are not literal values.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use mockkit_core::tester::lock;

use crate::value::{short_type_name, ErrorValue, Value};

type Predicate = Box<dyn Fn(&Value) -> Result<bool, String> + Send + Sync>;

/// Decides whether an actual argument satisfies an expected one.
///
/// ```
/// use mockkit_mock::{Matcher, Value};
///
/// let even = Matcher::by(|n: &i32| n % 2 == 0);
/// assert!(even.matches(&Value::new(4)));
/// assert!(!even.matches(&Value::new(3)));
/// assert!(!even.matches(&Value::new("4")));
/// ```
#[derive(Clone)]
pub struct Matcher {
    inner: Arc<Inner>,
}

struct Inner {
    kind: Kind,
    failure: Mutex<Option<Failure>>,
}

/// Why the last match of a predicate failed without a verdict.
enum Failure {
    /// The predicate rejected the value, e.g. nil for a typed predicate.
    Error(String),
    Panic(String),
}

enum Kind {
    TypeName(String),
    TypeOf { id: TypeId, name: &'static str },
    Predicate { describe: String, f: Predicate },
}

impl Matcher {
    fn from_kind(kind: Kind) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                failure: Mutex::new(None),
            }),
        }
    }

    fn predicate(
        describe: String,
        f: impl Fn(&Value) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        Self::from_kind(Kind::Predicate {
            describe,
            f: Box::new(f),
        })
    }

    /// Matches values whose type name is `name`, either short (`String`) or
    /// fully qualified (`alloc::string::String`).
    pub fn type_name(name: impl Into<String>) -> Self {
        Self::from_kind(Kind::TypeName(name.into()))
    }

    /// Matches values of the same type as `proto`.
    pub fn type_of<T: Any>(_proto: &T) -> Self {
        Self::from_kind(Kind::TypeOf {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        })
    }

    /// Matches values of type `T` accepted by `f`.
    ///
    /// Values of another type do not match. A [`Value::Nil`] is reported as
    /// not assignable to `T`.
    pub fn by<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let name = short_type_name(type_name::<T>());
        let nil_error = format!("[mock] MatchBy: nil is not assignable to {name}");
        Self::predicate(format!("mock.MatchBy=fn({name}) -> bool"), move |v| {
            if let Some(t) = (v as &dyn Any).downcast_ref::<T>() {
                return Ok(f(t));
            }
            match v {
                Value::Nil => Err(nil_error.clone()),
                v => Ok(v.downcast_ref::<T>().is_some_and(&f)),
            }
        })
    }

    /// Matches values accepted by `f`, which sees every value including
    /// [`Value::Nil`].
    pub fn by_value(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::predicate("mock.MatchBy=fn(Value) -> bool".to_string(), move |v| {
            Ok(f(v))
        })
    }

    /// Matches anything except [`Value::Nil`].
    pub fn not_nil() -> Self {
        Self::predicate("mock.NotNil".to_string(), |v| Ok(!v.is_nil()))
    }

    /// Matches an `Arc<T>` pointing at the same allocation as `target`.
    pub fn same<T: fmt::Debug + Send + Sync + 'static>(target: &Arc<T>) -> Self {
        let want = Value::shared(target);
        Self::predicate(
            format!("mock.Same={:p}", Arc::as_ptr(target)),
            move |v| Ok(want.deep_equal(v)),
        )
    }

    /// Matches errors whose message contains `fragment`.
    pub fn error_contains(fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::predicate(format!("mock.ErrorContains={fragment:?}"), move |v| {
            Ok(v
                .downcast_ref::<ErrorValue>()
                .is_some_and(|e| e.to_string().contains(fragment.as_str())))
        })
    }

    /// Matches `target` itself, or an error whose `source()` chain holds an
    /// error rendering the same as `target`.
    pub fn error_is(target: impl Into<ErrorValue>) -> Self {
        let target = target.into();
        Self::predicate(format!("mock.ErrorIs={:?}", target.to_string()), move |v| {
            let Some(have) = v.downcast_ref::<ErrorValue>() else {
                return Ok(false);
            };
            if have.ptr_eq(&target) {
                return Ok(true);
            }
            let want = (format!("{:?}", target.as_error()), target.to_string());
            let mut link: Option<&(dyn std::error::Error + 'static)> = Some(have.as_error());
            while let Some(e) = link {
                if (format!("{e:?}"), e.to_string()) == want {
                    return Ok(true);
                }
                link = e.source();
            }
            Ok(false)
        })
    }

    /// Reports whether `v` matches. A predicate that panics or rejects the
    /// value does not match; the message is kept for
    /// [`Matcher::panic_message`] or [`Matcher::error_message`].
    pub fn matches(&self, v: &Value) -> bool {
        match &self.inner.kind {
            Kind::TypeName(name) => match v {
                Value::Data(d) => d.type_name() == name.as_str() || d.short_type_name() == *name,
                Value::Func(_) => v.type_name() == *name,
                _ => false,
            },
            Kind::TypeOf { id, .. } => matches!(v, Value::Data(d) if d.type_id() == *id),
            Kind::Predicate { f, .. } => {
                let (matched, failure) =
                    match panic::catch_unwind(AssertUnwindSafe(|| f(v))) {
                        Ok(Ok(b)) => (b, None),
                        Ok(Err(msg)) => (false, Some(Failure::Error(msg))),
                        Err(payload) => {
                            (false, Some(Failure::Panic(panic_message(payload.as_ref()))))
                        }
                    };
                *lock(&self.inner.failure) = failure;
                matched
            }
        }
    }

    /// Stable description used in diffs.
    pub fn describe(&self) -> String {
        match &self.inner.kind {
            Kind::TypeName(name) => format!("mock.MatchType={name}"),
            Kind::TypeOf { name, .. } => format!("mock.MatchOfType={}", short_type_name(name)),
            Kind::Predicate { describe, .. } => describe.clone(),
        }
    }

    /// Message of the panic raised by the last match, if any.
    pub fn panic_message(&self) -> Option<String> {
        match &*lock(&self.inner.failure) {
            Some(Failure::Panic(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Why the predicate refused the last value without panicking, if it did.
    pub fn error_message(&self) -> Option<String> {
        match &*lock(&self.inner.failure) {
            Some(Failure::Error(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Matcher) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("not found: {0}")]
    struct NotFound(String);

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed")]
    struct Lookup {
        #[source]
        source: NotFound,
    }

    #[test]
    fn test_type_name() {
        let m = Matcher::type_name("String");
        assert!(m.matches(&Value::new("x")));
        assert!(Matcher::type_name("alloc::string::String").matches(&Value::new("x")));
        assert!(!m.matches(&Value::new(1)));
        assert!(!m.matches(&Value::Nil));
        assert_eq!(m.describe(), "mock.MatchType=String");
    }

    #[test]
    fn test_type_of() {
        let m = Matcher::type_of(&0u16);
        assert!(m.matches(&Value::new(9u16)));
        assert!(!m.matches(&Value::new(9u32)));
        assert_eq!(m.describe(), "mock.MatchOfType=u16");
    }

    #[test]
    fn test_by_nil_is_not_assignable() {
        let m = Matcher::by(|_: &String| true);
        assert!(!m.matches(&Value::Nil));
        assert_eq!(
            m.error_message().as_deref(),
            Some("[mock] MatchBy: nil is not assignable to String")
        );
        assert!(m.panic_message().is_none());
        assert_eq!(
            Value::Matcher(m.clone()).render(),
            r#"[mock.MatchBy=fn(String) -> bool] {error: "[mock] MatchBy: nil is not assignable to String"}"#
        );
        assert!(m.matches(&Value::new("a")));
        assert!(m.error_message().is_none());
        assert_eq!(Value::Matcher(m).render(), "[mock.MatchBy=fn(String) -> bool]");
    }

    #[test]
    fn test_by_value_sees_nil() {
        let m = Matcher::by_value(|v| v.is_nil());
        assert!(m.matches(&Value::Nil));
        let m = Matcher::by(|v: &Value| !v.is_nil());
        assert!(!m.matches(&Value::Nil));
        assert!(m.panic_message().is_none());
    }

    #[test]
    fn test_panicking_predicate() {
        let m = Matcher::by(|n: &i32| -> bool { panic!("bad {n}") });
        assert!(!m.matches(&Value::new(3)));
        assert_eq!(m.panic_message().as_deref(), Some("bad 3"));
        assert!(m.error_message().is_none());
        assert_eq!(
            Value::Matcher(m).render(),
            r#"[mock.MatchBy=fn(i32) -> bool] {panic: "bad 3"}"#
        );
    }

    #[test]
    fn test_not_nil() {
        let m = Matcher::not_nil();
        assert!(m.matches(&Value::new(0)));
        assert!(!m.matches(&Value::Nil));
        assert_eq!(m.describe(), "mock.NotNil");
    }

    #[test]
    fn test_same() {
        let a = Arc::new(1);
        let m = Matcher::same(&a);
        assert!(m.matches(&Value::new(a.clone())));
        assert!(!m.matches(&Value::new(Arc::new(1))));
    }

    #[test]
    fn test_error_matchers() {
        let e = ErrorValue::new(Lookup {
            source: NotFound("k".into()),
        });
        let v = Value::new(e.clone());
        assert!(Matcher::error_contains("lookup").matches(&v));
        assert!(!Matcher::error_contains("disk").matches(&v));
        assert!(Matcher::error_is(e).matches(&v));
        assert!(Matcher::error_is(NotFound("k".into())).matches(&v));
        assert!(!Matcher::error_is(NotFound("j".into())).matches(&v));
        assert_eq!(
            Matcher::error_contains("x").describe(),
            "mock.ErrorContains=\"x\""
        );
    }
}
