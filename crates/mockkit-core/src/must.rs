//! Panic-on-error unwrappers for test setup code.

use std::fmt::Display;

/// Returns the value or panics with the error.
///
/// ```
/// let n: i32 = mockkit_core::must::value("42".parse::<i32>());
/// assert_eq!(n, 42);
/// ```
#[track_caller]
pub fn value<T, E: Display>(r: Result<T, E>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    }
}

/// Returns both values or panics with the error.
#[track_caller]
pub fn values<A, B, E: Display>(r: Result<(A, B), E>) -> (A, B) {
    value(r)
}

/// Panics if `r` carries an error.
#[track_caller]
pub fn nil<E: Display>(r: Result<(), E>) {
    value(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ok() {
        assert_eq!(value::<_, String>(Ok(3)), 3);
        assert_eq!(values::<_, _, String>(Ok((1, "a"))), (1, "a"));
        nil::<String>(Ok(()));
    }

    #[test]
    #[should_panic(expected = "invalid digit")]
    fn test_value_panics_with_error() {
        value("x".parse::<i32>());
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_nil_panics() {
        nil(Err("boom"));
    }
}
