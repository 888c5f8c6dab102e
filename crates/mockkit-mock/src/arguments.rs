//! Argument lists, typed accessors and position-by-position diffs.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::value::{short_type_name, ErrorValue, IntoValue, Value};

/// Builds [`Arguments`] from heterogeneous expressions.
///
/// ```
/// use mockkit_mock::{args, ANY};
///
/// let a = args![1, "two", ANY];
/// assert_eq!(a.len(), 3);
/// assert_eq!(a.string(1), "two");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($($v:expr),+ $(,)?) => {
        $crate::Arguments::from(vec![$($crate::value!($v)),+])
    };
}

/// An ordered list of argument or return values.
#[derive(Clone, Default)]
pub struct Arguments(Vec<Value>);

/// Result of comparing expected arguments with actual ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgsDiff {
    /// One line per position.
    pub lines: Vec<String>,
    /// Number of failing positions.
    pub failures: usize,
}

impl ArgsDiff {
    pub fn is_match(&self) -> bool {
        self.failures == 0
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, v: impl IntoValue) {
        self.0.push(v.into_value());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// Returns the value at `i`.
    ///
    /// # Panics
    ///
    /// When `i` is out of range.
    #[track_caller]
    pub fn get(&self, i: usize) -> &Value {
        match self.0.get(i) {
            Some(v) => v,
            None => panic!(
                "[mock] arguments: Get({i}) out of range {} max",
                self.0.len()
            ),
        }
    }

    /// Replaces the value at `i`.
    #[track_caller]
    pub fn set(&mut self, i: usize, v: impl IntoValue) {
        let len = self.0.len();
        match self.0.get_mut(i) {
            Some(slot) => *slot = v.into_value(),
            None => panic!("[mock] arguments: Get({i}) out of range {len} max"),
        }
    }

    /// Returns the value at `i` if it is a `T`.
    #[track_caller]
    pub fn downcast_ref<T: Any>(&self, i: usize) -> Option<&T> {
        self.get(i).downcast_ref()
    }

    #[track_caller]
    pub fn string(&self, i: usize) -> String {
        let v = self.get(i);
        match v.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => panic!(
                "[mock] arguments: String({i}) is of type \"{}\" not string",
                v.type_name()
            ),
        }
    }

    /// Returns a signed integer of any width, widened to `i64`.
    #[track_caller]
    pub fn int(&self, i: usize) -> i64 {
        let v = self.get(i);
        let n = if let Some(n) = v.downcast_ref::<i64>() {
            Some(*n)
        } else if let Some(n) = v.downcast_ref::<i32>() {
            Some(i64::from(*n))
        } else if let Some(n) = v.downcast_ref::<i16>() {
            Some(i64::from(*n))
        } else if let Some(n) = v.downcast_ref::<i8>() {
            Some(i64::from(*n))
        } else {
            v.downcast_ref::<isize>().map(|n| *n as i64)
        };
        match n {
            Some(n) => n,
            None => panic!(
                "[mock] arguments: Int({i}) is of type \"{}\" not int",
                v.type_name()
            ),
        }
    }

    #[track_caller]
    pub fn bool(&self, i: usize) -> bool {
        let v = self.get(i);
        match v.downcast_ref::<bool>() {
            Some(b) => *b,
            None => panic!(
                "[mock] arguments: Bool({i}) is of type \"{}\" not bool",
                v.type_name()
            ),
        }
    }

    /// Returns the error at `i`, or `None` for [`Value::Nil`].
    #[track_caller]
    pub fn error(&self, i: usize) -> Option<ErrorValue> {
        let v = self.get(i);
        if v.is_nil() {
            return None;
        }
        match v.downcast_ref::<ErrorValue>() {
            Some(e) => Some(e.clone()),
            None => panic!(
                "[mock] arguments: Error({i}) is of type \"{}\" not error",
                v.type_name()
            ),
        }
    }

    /// Extracts a configured return value of type `T`.
    ///
    /// A `T` of [`Value`] receives the value as is.
    pub fn returned<T: Any + Clone>(&self, i: usize) -> Result<T, String> {
        let Some(v) = self.0.get(i) else {
            return Err(format!(
                "[mock] arguments: Get({i}) out of range {} max",
                self.0.len()
            ));
        };
        if let Some(v) = (v as &dyn Any).downcast_ref::<T>() {
            return Ok(v.clone());
        }
        let want = short_type_name(type_name::<T>());
        if v.is_nil() {
            return Err(format!("[mock] return value {i} is nil, want {want}"));
        }
        match v.downcast_ref::<T>() {
            Some(v) => Ok(v.clone()),
            None => Err(format!(
                "[mock] return value {i} is of type \"{}\" not \"{want}\"",
                v.type_name()
            )),
        }
    }

    /// Returns the return producer at `i` if it was stored as an `Arc<F>`.
    pub fn func<F: ?Sized + 'static>(&self, i: usize) -> Option<Arc<F>> {
        match self.0.get(i) {
            Some(Value::Func(f)) => f.get::<F>(),
            _ => None,
        }
    }

    /// Compares these expected arguments with `actual`.
    pub fn diff(&self, actual: &Arguments) -> ArgsDiff {
        let mut out = ArgsDiff::default();
        let max = self.len().max(actual.len());
        for i in 0..max {
            let want = self.0.get(i);
            let have = actual.0.get(i);
            let ok = match (want, have) {
                (Some(Value::Any), Some(_)) => true,
                (Some(Value::Matcher(m)), Some(h)) => m.matches(h),
                (Some(w), Some(h)) => w.deep_equal(h),
                _ => false,
            };
            // Render after matching so a captured panic shows up.
            let want = want.map_or_else(|| "(Missing)".to_string(), Value::render);
            let have = have.map_or_else(|| "(Missing)".to_string(), Value::render);
            if ok {
                out.lines.push(format!("{i}: PASS: {want} == {have}"));
            } else {
                out.failures += 1;
                out.lines.push(format!("{i}: FAIL: {want} != {have}"));
            }
        }
        out
    }

    /// Pairwise deep equality.
    ///
    /// # Panics
    ///
    /// When the lengths differ.
    #[track_caller]
    pub fn equal(&self, other: &Arguments) -> bool {
        if self.len() != other.len() {
            panic!(
                "[must] arguments: argument lengths do not match {} != {}",
                self.len(),
                other.len()
            );
        }
        self.0.iter().zip(&other.0).all(|(a, b)| a.deep_equal(b))
    }

    /// Type names of the values, as used in method signatures.
    pub(crate) fn type_names(&self) -> Vec<String> {
        self.0.iter().map(Value::type_name).collect()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(v: Vec<Value>) -> Self {
        Self(v)
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.0).finish()
    }
}
