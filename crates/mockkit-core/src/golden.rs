//! Golden test data files.
//!
//! A golden file starts with free-form commentary for humans. The test data
//! is everything after the first line consisting solely of `---`.

use std::path::Path;

use crate::tester::TestingT;

const MARKER: &[u8] = b"---\n";

/// Loads the data section of a golden file as text.
pub fn load(t: &dyn TestingT, path: impl AsRef<Path>) -> String {
    t.helper();
    let path = path.as_ref();
    let data = load_bytes(t, path);
    match String::from_utf8(data) {
        Ok(s) => s,
        Err(e) => t.fatal(&format!("golden: {}: {e}", path.display())),
    }
}

/// Loads the data section of a golden file.
pub fn load_bytes(t: &dyn TestingT, path: impl AsRef<Path>) -> Vec<u8> {
    t.helper();
    let path = path.as_ref();
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => t.fatal(&format!("golden: {}: {e}", path.display())),
    };
    match split(&content) {
        Some(data) => data.to_vec(),
        None => t.fatal(&format!(
            "golden: {}: missing \"---\" marker line",
            path.display()
        )),
    }
}

/// Returns the bytes following the first marker line.
fn split(content: &[u8]) -> Option<&[u8]> {
    let mut offset = 0;
    for line in content.split_inclusive(|b| *b == b'\n') {
        offset += line.len();
        if line == MARKER {
            return Some(&content[offset..]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::Spy;

    #[test]
    fn test_split_after_marker() {
        assert_eq!(split(b"notes\n---\ndata\n"), Some(&b"data\n"[..]));
        assert_eq!(split(b"---\n"), Some(&b""[..]));
        assert_eq!(split(b"a\n---\nb\n---\nc"), Some(&b"b\n---\nc"[..]));
    }

    #[test]
    fn test_split_requires_exact_line() {
        assert_eq!(split(b"----\nx"), None);
        assert_eq!(split(b" ---\nx"), None);
        assert_eq!(split(b"notes\n---"), None);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.golden");
        std::fs::write(&path, "what this checks\n---\nline 1\nline 2\n").unwrap();
        let spy = Spy::new();
        assert_eq!(load(&*spy.t(), &path), "line 1\nline 2\n");
        assert!(spy.verify().is_empty());
    }

    #[test]
    fn test_missing_marker_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.golden");
        std::fs::write(&path, "no marker here\n").unwrap();
        let spy = Spy::new();
        spy.expect_fatal();
        let t = spy.t();
        assert!(spy.catch(|| load(&*t, &path)).is_none());
        assert!(spy.fatals()[0].contains("missing \"---\" marker"));
        assert!(spy.verify().is_empty());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let spy = Spy::new();
        spy.expect_fatal();
        let t = spy.t();
        assert!(spy.catch(|| load_bytes(&*t, "/nonexistent/x.golden")).is_none());
        assert!(spy.verify().is_empty());
    }
}
