//! Dynamically typed argument and return values.

use std::any::{type_name, Any, TypeId};
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use crate::matcher::Matcher;

/// Wildcard expected argument matching any actual value.
pub const ANY: Value = Value::Any;

/// One argument or return value.
#[derive(Clone)]
pub enum Value {
    /// An explicitly absent value.
    Nil,
    /// The wildcard, see [`ANY`].
    Any,
    Matcher(Matcher),
    /// A return producer called with the method arguments.
    Func(FuncValue),
    Data(Data),
}

impl Value {
    /// Wraps `v`, normalizing values that already have a dedicated variant.
    ///
    /// A `Value` is passed through, a [`Matcher`] or [`FuncValue`] gets its
    /// own variant, `&'static str` is stored as `String` and a boxed error
    /// as an [`ErrorValue`]. The result compares by `Debug` output; use
    /// [`Value::comparable`] or the [`value!`](crate::value!) macro to keep
    /// the type's `PartialEq`.
    pub fn new<T: Any + Debug + Send + Sync>(v: T) -> Value {
        let mut slot = Some(v);
        if let Some(v) = take::<Value, T>(&mut slot) {
            return v;
        }
        if let Some(m) = take::<Matcher, T>(&mut slot) {
            return Value::Matcher(m);
        }
        if let Some(f) = take::<FuncValue, T>(&mut slot) {
            return Value::Func(f);
        }
        if let Some(s) = take::<&'static str, T>(&mut slot) {
            return Value::Data(Data::comparable(s.to_string()));
        }
        if let Some(e) = take::<Box<dyn Error + Send + Sync>, T>(&mut slot) {
            return Value::Data(Data::new(ErrorValue::from_boxed(e)));
        }
        match slot {
            Some(v) => Value::Data(Data::new(v)),
            None => Value::Nil,
        }
    }

    /// Like [`Value::new`], comparing data with `T`'s `PartialEq`.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use mockkit_mock::Value;
    ///
    /// let a: HashMap<u8, u8> = (0..16).map(|i| (i, i)).collect();
    /// let b: HashMap<u8, u8> = (0..16).rev().map(|i| (i, i)).collect();
    /// assert!(Value::comparable(a).deep_equal(&Value::comparable(b)));
    /// ```
    pub fn comparable<T: Any + Debug + Send + Sync + PartialEq>(v: T) -> Value {
        match Value::new(v) {
            Value::Data(mut d) if d.is::<T>() && d.identity.is_none() => {
                d.eq = Some(eq_as::<T>);
                Value::Data(d)
            }
            other => other,
        }
    }

    /// Stores an error.
    pub fn error<E: Error + Send + Sync + 'static>(e: E) -> Value {
        Value::Data(Data::new(ErrorValue::new(e)))
    }

    /// Stores a return producer.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use mockkit_mock::Value;
    ///
    /// let v = Value::func::<dyn Fn(i32) -> i32 + Send + Sync>(Arc::new(|n| n * 2));
    /// assert!(matches!(v, Value::Func(_)));
    /// ```
    pub fn func<F: ?Sized + Send + Sync + 'static>(f: Arc<F>) -> Value {
        Value::Func(FuncValue::new(f))
    }

    /// A placeholder for an argument that cannot be captured, such as an
    /// `impl Trait` or `dyn Trait` parameter. Rendered as its type name.
    pub fn opaque(type_name: impl Into<String>) -> Value {
        Value::Data(Data::comparable(Opaque(type_name.into())))
    }

    /// Stores a clone of `v` compared by reference identity instead of by
    /// content.
    pub fn shared<T: Debug + Send + Sync + 'static>(v: &Arc<T>) -> Value {
        let mut data = Data::new(v.clone());
        data.identity = Some(arc_addr::<T> as fn(&dyn Any) -> Option<usize>);
        Value::Data(data)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns the stored value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Data(d) => d.downcast_ref(),
            _ => None,
        }
    }

    /// Short type name of the value, as shown in failure messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "<nil>".to_string(),
            Value::Any => "mock.Any".to_string(),
            Value::Matcher(m) => m.describe(),
            Value::Func(f) => short_type_name(f.type_name),
            Value::Data(d) => d.short_type_name(),
        }
    }

    /// Structural deep equality.
    ///
    /// Two data values are equal when they hold the same type and compare
    /// equal with its `PartialEq`, when either side was built with one. Other
    /// data compares by pretty `Debug` output. Shared values compare by
    /// reference.
    pub fn deep_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::Any, Value::Any) => true,
            (Value::Matcher(a), Value::Matcher(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(&a.f, &b.f),
            (Value::Data(a), Value::Data(b)) => a.deep_equal(b),
            _ => false,
        }
    }

    /// Whether the value is a function or a function-typed datum.
    pub(crate) fn is_function(&self) -> bool {
        match self {
            Value::Func(_) => true,
            Value::Data(d) => {
                let name = d.type_name;
                name.starts_with("fn(")
                    || name.starts_with("unsafe fn(")
                    || name.starts_with("extern ")
                    || name.contains("{{closure}}")
            }
            _ => false,
        }
    }

    /// Renders the value the way diffs show it.
    pub fn render(&self) -> String {
        match self {
            Value::Nil => "(nil)".to_string(),
            Value::Any => "(any=mock.Any)".to_string(),
            Value::Matcher(m) => match (m.panic_message(), m.error_message()) {
                (Some(msg), _) => format!("[{}] {{panic: {msg:?}}}", m.describe()),
                (None, Some(msg)) => format!("[{}] {{error: {msg:?}}}", m.describe()),
                (None, None) => format!("[{}]", m.describe()),
            },
            Value::Func(f) => format!("({}=fn)", short_type_name(f.type_name)),
            Value::Data(d) => match d.downcast_ref::<Opaque>() {
                Some(o) => format!("({0}={0})", o.0),
                None => format!("({}={d:?})", d.short_type_name()),
            },
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Conversion into a [`Value`], implemented for every storable type.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl<T: Any + Debug + Send + Sync> IntoValue for T {
    fn into_value(self) -> Value {
        Value::new(self)
    }
}

/// Moves the content of `slot` out if it holds a `U`.
pub(crate) fn take<U: 'static, T: 'static>(slot: &mut Option<T>) -> Option<U> {
    (slot as &mut dyn Any)
        .downcast_mut::<Option<U>>()
        .and_then(Option::take)
}

trait DataValue: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Any + Debug + Send + Sync> DataValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// A type-erased datum.
#[derive(Clone)]
pub struct Data {
    value: Arc<dyn DataValue>,
    type_id: TypeId,
    type_name: &'static str,
    identity: Option<fn(&dyn Any) -> Option<usize>>,
    eq: Option<fn(&dyn Any, &dyn Any) -> bool>,
}

impl Data {
    pub fn new<T: Any + Debug + Send + Sync>(v: T) -> Self {
        Self {
            value: Arc::new(v),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            identity: None,
            eq: None,
        }
    }

    /// A datum compared with `T`'s `PartialEq`.
    pub fn comparable<T: Any + Debug + Send + Sync + PartialEq>(v: T) -> Self {
        Self {
            eq: Some(eq_as::<T>),
            ..Self::new(v)
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn short_type_name(&self) -> String {
        match self.downcast_ref::<Opaque>() {
            Some(o) => o.0.clone(),
            None => short_type_name(self.type_name),
        }
    }

    fn deep_equal(&self, other: &Data) -> bool {
        if self.type_id != other.type_id {
            return false;
        }
        if let Some(addr) = self.identity.or(other.identity) {
            let a = addr(self.value.as_any());
            return a.is_some() && a == addr(other.value.as_any());
        }
        if let Some(eq) = self.eq.or(other.eq) {
            return eq(self.value.as_any(), other.value.as_any());
        }
        format!("{self:#?}") == format!("{other:#?}")
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.debug(f)
    }
}

fn eq_as<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn arc_addr<T: Send + Sync + 'static>(v: &dyn Any) -> Option<usize> {
    v.downcast_ref::<Arc<T>>()
        .map(|a| Arc::as_ptr(a) as *const () as usize)
}

/// Placeholder for an uncapturable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Opaque(String);

/// A type-erased `Arc<F>` where `F` is usually a `dyn Fn(..) -> R`.
#[derive(Clone)]
pub struct FuncValue {
    f: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl FuncValue {
    pub fn new<F: ?Sized + Send + Sync + 'static>(f: Arc<F>) -> Self {
        Self {
            f: Arc::new(f),
            type_name: type_name::<F>(),
        }
    }

    /// Returns the function if it was stored as an `Arc<F>`.
    pub fn get<F: ?Sized + 'static>(&self) -> Option<Arc<F>> {
        self.f.downcast_ref::<Arc<F>>().cloned()
    }
}

impl Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", short_type_name(self.type_name))
    }
}

/// A shareable error value.
#[derive(Clone)]
pub struct ErrorValue(Arc<dyn Error + Send + Sync>);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MessageError(String);

impl ErrorValue {
    pub fn new<E: Error + Send + Sync + 'static>(e: E) -> Self {
        Self(Arc::new(e))
    }

    /// An error carrying only a message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::new(MessageError(msg.into()))
    }

    pub fn from_boxed(e: Box<dyn Error + Send + Sync>) -> Self {
        Self(Arc::from(e))
    }

    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &ErrorValue) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl<E: Error + Send + Sync + 'static> From<E> for ErrorValue {
    fn from(e: E) -> Self {
        Self::new(e)
    }
}

impl Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&*self.0, f)
    }
}

/// Strips module paths from every path in a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment = out.len();
        }
    }
    out
}
