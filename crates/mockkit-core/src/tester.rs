//! The test-manager contract.
//!
//! Everything that reports a test outcome (the mock runtime, golden loading,
//! generated mocks) talks to a [`TestingT`]. Two implementations ship with the
//! crate: [`TestContext`] for ordinary `#[test]` functions and
//! [`Spy`](crate::spy::Spy) for tests that assert on reported failures.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tempfile::TempDir;

/// A cleanup callback registered with [`TestingT::cleanup`].
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// The surface the mock runtime needs from a test manager.
pub trait TestingT: Send + Sync {
    /// Marks the caller as a test helper.
    fn helper(&self);

    /// Registers a function to run when the test ends. Cleanups run
    /// last-in first-out.
    fn cleanup(&self, f: Cleanup);

    /// Fails the test and continues.
    fn error(&self, msg: &str);

    /// Fails the test and halts the current thread of the test.
    fn fatal(&self, msg: &str) -> !;

    /// Records diagnostic output.
    fn log(&self, msg: &str);

    /// Returns a directory removed when the test ends.
    fn temp_dir(&self) -> PathBuf;

    /// Reports whether the test has failed.
    fn failed(&self) -> bool;

    /// Returns the test name.
    fn name(&self) -> String;
}

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// Fatal failures unwind through code holding locks, so poisoning is an
/// expected state here rather than a bug.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`TestingT`] for `#[test]` functions.
///
/// Errors are collected while the test runs. When the context is dropped the
/// registered cleanups run, temporary directories are removed and, if any
/// error was reported, the test fails with all collected messages.
///
/// ```
/// use mockkit_core::tester::TestContext;
///
/// let ctx = TestContext::new("doc");
/// let t = ctx.t();
/// t.log("hello");
/// assert!(!t.failed());
/// ```
pub struct TestContext {
    state: Arc<ContextState>,
}

struct ContextState {
    name: String,
    failed: AtomicBool,
    errors: Mutex<Vec<String>>,
    cleanups: Mutex<Vec<Cleanup>>,
    temp_dirs: Mutex<Vec<TempDir>>,
}

impl TestContext {
    /// Creates a context with the given test name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ContextState {
                name: name.into(),
                failed: AtomicBool::new(false),
                errors: Mutex::new(Vec::new()),
                cleanups: Mutex::new(Vec::new()),
                temp_dirs: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a context named after the current thread, which is the test
    /// name under the default test harness.
    pub fn current() -> Self {
        let name = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        Self::new(name)
    }

    /// Returns a shareable handle implementing [`TestingT`].
    pub fn t(&self) -> Arc<dyn TestingT> {
        self.state.clone()
    }

    /// Runs the registered cleanups and returns the collected errors without
    /// failing the test.
    pub fn finish(self) -> Vec<String> {
        self.state.run_cleanups();
        let errors = std::mem::take(&mut *lock(&self.state.errors));
        lock(&self.state.temp_dirs).clear();
        errors
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::current()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.state.run_cleanups();
        lock(&self.state.temp_dirs).clear();
        let errors = std::mem::take(&mut *lock(&self.state.errors));
        if !errors.is_empty() && !std::thread::panicking() {
            panic!("{}", errors.join("\n\n"));
        }
    }
}

impl ContextState {
    fn run_cleanups(&self) {
        loop {
            let batch = std::mem::take(&mut *lock(&self.cleanups));
            if batch.is_empty() {
                return;
            }
            for f in batch.into_iter().rev() {
                f();
            }
        }
    }
}

impl TestingT for ContextState {
    fn helper(&self) {}

    fn cleanup(&self, f: Cleanup) {
        lock(&self.cleanups).push(f);
    }

    fn error(&self, msg: &str) {
        self.failed.store(true, Ordering::SeqCst);
        lock(&self.errors).push(msg.to_string());
    }

    fn fatal(&self, msg: &str) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        // The panic message carries the failure; do not report it twice.
        panic!("{msg}");
    }

    fn log(&self, msg: &str) {
        println!("{msg}");
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
        self.failed.load(Ordering::SeqCst)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
