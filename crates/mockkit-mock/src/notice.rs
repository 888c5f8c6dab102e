//! Structured failure messages.

use std::fmt;

pub const UNEXPECTED_CALL: &str = "[mock] unexpected method call";
pub const TOO_MANY_CALLS: &str = "[mock] too many method calls";
pub const TOO_FEW_CALLS: &str = "[mock] too few method calls";
pub const CALL_NOT_FOUND: &str = "[mock] method call not found";
pub const NEVER_CALLED: &str = "[mock] method never called";
pub const PREREQUISITES_NOT_MET: &str = "[mock] method call prerequisites not met";
pub const EXPECTATION_NOT_FOUND: &str = "[mock] expectation not found";

/// A failure message: a header followed by right-aligned `key: value` rows
/// and free-form body lines.
///
/// ```
/// use mockkit_mock::Notice;
///
/// let n = Notice::new("[mock] too many method calls")
///     .append("method", "Zero(i32)")
///     .append("want", 1);
/// assert_eq!(
///     n.to_string(),
///     "[mock] too many method calls:\n  method: Zero(i32)\n    want: 1"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    header: String,
    rows: Vec<(String, String)>,
    lines: Vec<String>,
}

impl Notice {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            rows: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn append(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.rows.push((key.into(), value.to_string()));
        self
    }

    /// Appends a body line, printed after the rows.
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Value of the first row named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.header)?;
        let width = self.rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 2;
        for (key, value) in &self.rows {
            let mut value_lines = value.lines();
            write!(
                f,
                "\n{key:>width$}: {}",
                value_lines.next().unwrap_or_default()
            )?;
            for more in value_lines {
                write!(f, "\n{:width$}  {more}", "")?;
            }
        }
        for line in &self.lines {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}
