//! A recording [`TestingT`] for testing code that reports test failures.
//!
//! The spy never fails the real test on its own. It records what was
//! reported and compares it with what the test declared it expects.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::tester::{lock, Cleanup, TestingT};

/// Panic payload used by [`Spy`] to halt on `fatal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpyFatal(pub String);

/// Records calls made through [`TestingT`].
///
/// ```
/// use mockkit_core::spy::Spy;
///
/// let spy = Spy::new();
/// spy.expect_error().expect_log_contain("boom");
/// let t = spy.t();
/// t.error("boom");
/// t.log("boom happened");
/// assert!(spy.verify().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Spy {
    state: Arc<SpyState>,
}

#[derive(Default)]
struct SpyState {
    record: Mutex<Record>,
    expect: Mutex<Expect>,
    temp_dirs: Mutex<Vec<TempDir>>,
}

#[derive(Default)]
struct Record {
    helpers: usize,
    errors: Vec<String>,
    fatals: Vec<String>,
    logs: Vec<String>,
    cleanups: Vec<Cleanup>,
    registered: usize,
}

#[derive(Default)]
struct Expect {
    error: bool,
    fatal: bool,
    log_equal: Option<String>,
    log_contain: Vec<String>,
    cleanups: Option<usize>,
    ignore_logs: bool,
}

impl Spy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a shareable handle implementing [`TestingT`].
    pub fn t(&self) -> Arc<dyn TestingT> {
        self.state.clone()
    }

    /// Declares that at least one error is expected.
    pub fn expect_error(&self) -> &Self {
        lock(&self.state.expect).error = true;
        self
    }

    /// Declares that a fatal failure is expected. Implies an error.
    pub fn expect_fatal(&self) -> &Self {
        let mut e = lock(&self.state.expect);
        e.error = true;
        e.fatal = true;
        self
    }

    /// Declares the exact expected log output.
    pub fn expect_log_equal(&self, text: impl Into<String>) -> &Self {
        lock(&self.state.expect).log_equal = Some(text.into());
        self
    }

    /// Declares a fragment the log output must contain.
    pub fn expect_log_contain(&self, fragment: impl Into<String>) -> &Self {
        lock(&self.state.expect).log_contain.push(fragment.into());
        self
    }

    /// Declares how many cleanups must be registered.
    pub fn expect_cleanups(&self, n: usize) -> &Self {
        lock(&self.state.expect).cleanups = Some(n);
        self
    }

    /// Accepts any log output.
    pub fn ignore_logs(&self) -> &Self {
        lock(&self.state.expect).ignore_logs = true;
        self
    }

    /// Runs `f`, swallowing a halt caused by [`TestingT::fatal`].
    ///
    /// Returns `None` when `f` was halted. Other panics propagate.
    pub fn catch<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(v) => Some(v),
            Err(payload) if payload.is::<SpyFatal>() => None,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Runs registered cleanups, last-in first-out.
    pub fn close(&self) {
        loop {
            let batch = std::mem::take(&mut lock(&self.state.record).cleanups);
            if batch.is_empty() {
                break;
            }
            for f in batch.into_iter().rev() {
                f();
            }
        }
        lock(&self.state.temp_dirs).clear();
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.state.record).errors.clone()
    }

    pub fn fatals(&self) -> Vec<String> {
        lock(&self.state.record).fatals.clone()
    }

    /// Returns every error and fatal message, in reporting order within
    /// each kind, errors first.
    pub fn messages(&self) -> String {
        let r = lock(&self.state.record);
        r.errors
            .iter()
            .chain(r.fatals.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the log output, one line per logged message.
    pub fn log_text(&self) -> String {
        let r = lock(&self.state.record);
        r.logs.iter().map(|l| format!("{l}\n")).collect()
    }

    pub fn helper_calls(&self) -> usize {
        lock(&self.state.record).helpers
    }

    /// Compares what was recorded with what was declared.
    ///
    /// Returns one message per mismatch; empty means the spy is satisfied.
    pub fn verify(&self) -> Vec<String> {
        let r = lock(&self.state.record);
        let e = lock(&self.state.expect);
        let mut out = Vec::new();

        let failed = !r.errors.is_empty() || !r.fatals.is_empty();
        if e.error && !failed {
            out.push("expected test to fail, but it passed".to_string());
        }
        if !e.error && failed {
            let all: Vec<&str> = r
                .errors
                .iter()
                .chain(r.fatals.iter())
                .map(String::as_str)
                .collect();
            out.push(format!("unexpected test failure:\n{}", all.join("\n")));
        }
        if e.fatal && r.fatals.is_empty() {
            out.push("expected fatal failure, but none was reported".to_string());
        }
        if !e.fatal && !r.fatals.is_empty() {
            out.push(format!("unexpected fatal failure: {}", r.fatals.join("\n")));
        }

        let log: String = r.logs.iter().map(|l| format!("{l}\n")).collect();
        if let Some(want) = &e.log_equal {
            if &log != want {
                out.push(format!("log mismatch:\n  want: {want:?}\n  have: {log:?}"));
            }
        }
        for fragment in &e.log_contain {
            if !log.contains(fragment.as_str()) {
                out.push(format!("log does not contain {fragment:?}:\n{log}"));
            }
        }
        let log_declared = e.log_equal.is_some() || !e.log_contain.is_empty();
        if !e.ignore_logs && !log_declared && !log.is_empty() {
            out.push(format!("unexpected log output:\n{log}"));
        }

        if let Some(want) = e.cleanups {
            if want != r.registered {
                out.push(format!(
                    "expected {want} cleanup(s), {} registered",
                    r.registered
                ));
            }
        }
        out
    }

    /// Panics with every mismatch reported by [`Spy::verify`].
    pub fn assert(&self) {
        let mismatches = self.verify();
        if !mismatches.is_empty() {
            panic!("[spy] {}", mismatches.join("\n[spy] "));
        }
    }
}

impl TestingT for SpyState {
    fn helper(&self) {
        lock(&self.record).helpers += 1;
    }

    fn cleanup(&self, f: Cleanup) {
        let mut r = lock(&self.record);
        r.registered += 1;
        r.cleanups.push(f);
    }

    fn error(&self, msg: &str) {
        lock(&self.record).errors.push(msg.to_string());
    }

    fn fatal(&self, msg: &str) -> ! {
        lock(&self.record).fatals.push(msg.to_string());
        panic::panic_any(SpyFatal(msg.to_string()));
    }

    fn log(&self, msg: &str) {
        lock(&self.record).logs.push(msg.to_string());
    }

    fn temp_dir(&self) -> PathBuf {
        match TempDir::new() {
            Ok(dir) => {
                let path = dir.path().to_path_buf();
                lock(&self.temp_dirs).push(dir);
                path
            }
            Err(e) => self.fatal(&format!("temp_dir: {e}")),
        }
    }

    fn failed(&self) -> bool {
        let r = lock(&self.record);
        !r.errors.is_empty() || !r.fatals.is_empty()
    }

    fn name(&self) -> String {
        "spy".to_string()
    }
}
