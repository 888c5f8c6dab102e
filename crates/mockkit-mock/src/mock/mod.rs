//! The mock instance: registered expectations, recorded invocations and the
//! end-of-test audit.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mockkit_core::tester::{lock, TestingT};

use crate::arguments::Arguments;
use crate::call::Call;
use crate::notice::{
    Notice, EXPECTATION_NOT_FOUND, NEVER_CALLED, TOO_FEW_CALLS, TOO_MANY_CALLS,
};
use crate::proxy::Proxy;
use crate::selector::{actual_signature, select};
use crate::value::{IntoValue, Value};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub method: String,
    pub args: Arguments,
    /// Captured when the mock was built with [`Mock::with_stacks`].
    pub backtrace: Option<Arc<Backtrace>>,
}

/// Records expected calls and validates actual ones.
///
/// `Mock` is a cheap handle; clones share the same state. Creating a mock
/// registers a cleanup with the test manager that audits every expectation
/// when the test ends.
///
/// ```
/// use mockkit_core::tester::TestContext;
/// use mockkit_mock::{args, Mock, ANY};
///
/// let ctx = TestContext::new("doc");
/// let mock = Mock::new(ctx.t());
/// mock.on("M", args![1]).returns(args!["a"]);
/// mock.on("M", args![ANY]).returns(args!["b"]);
/// assert_eq!(mock.call("M", args![1]).string(0), "a");
/// assert_eq!(mock.call("M", args![2]).string(0), "b");
/// ```
#[derive(Clone)]
pub struct Mock {
    inner: Arc<MockInner>,
}

struct MockInner {
    id: u64,
    t: Arc<dyn TestingT>,
    stacks: bool,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    expected: Vec<Call>,
    calls: Vec<Invocation>,
    data: HashMap<String, Value>,
    failed: bool,
    audited: Option<bool>,
}

impl Mock {
    pub fn new(t: Arc<dyn TestingT>) -> Self {
        Self::build(t, false)
    }

    /// Like [`Mock::new`], also capturing a backtrace for every invocation.
    pub fn with_stacks(t: Arc<dyn TestingT>) -> Self {
        Self::build(t, true)
    }

    fn build(t: Arc<dyn TestingT>, stacks: bool) -> Self {
        let mock = Self {
            inner: Arc::new(MockInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                t: t.clone(),
                stacks,
                state: Mutex::new(MockState::default()),
            }),
        };
        let audited = mock.clone();
        t.cleanup(Box::new(move || {
            audited.assert_expectations();
        }));
        mock
    }

    /// The test manager failures are reported to.
    pub fn t(&self) -> Arc<dyn TestingT> {
        self.inner.t.clone()
    }

    /// Expects `method` to be called with `args`.
    ///
    /// # Panics
    ///
    /// When `args` holds a function value.
    #[track_caller]
    pub fn on(&self, method: &str, args: Arguments) -> Call {
        let call = Call::new(
            self.inner.id,
            method,
            Some(args),
            false,
            None,
            Location::caller(),
        );
        self.register(call)
    }

    /// Expects `method` to be called with any arguments.
    #[track_caller]
    pub fn on_any(&self, method: &str) -> Call {
        let call = Call::new(self.inner.id, method, None, true, None, Location::caller());
        self.register(call)
    }

    /// Answers calls with a function. The method is the proxy's name.
    ///
    /// # Panics
    ///
    /// When the proxy has no name, which is the case for closures not named
    /// with [`Proxy::named`].
    #[track_caller]
    pub fn proxy(&self, proxy: Proxy) -> Call {
        let Some(method) = proxy.name().map(str::to_string) else {
            panic!("[mock] cannot derive a method name from {proxy:?}, use Proxy::named");
        };
        let call = Call::new(
            self.inner.id,
            &method,
            None,
            false,
            Some(proxy),
            Location::caller(),
        );
        self.register(call)
    }

    /// Like [`Mock::proxy`], answering calls to `method`.
    #[track_caller]
    pub fn proxy_named(&self, method: &str, proxy: Proxy) -> Call {
        self.proxy(proxy.named(method))
    }

    fn register(&self, call: Call) -> Call {
        lock(&self.inner.state).expected.push(call.clone());
        call
    }

    /// Removes an expectation. Reports a test error when it is not
    /// registered with this mock.
    pub fn unset(&self, call: &Call) {
        self.inner.t.helper();
        let removed = {
            let mut s = lock(&self.inner.state);
            let before = s.expected.len();
            s.expected.retain(|c| !c.ptr_eq(call));
            s.expected.len() != before
        };
        if !removed {
            let n = Notice::new(EXPECTATION_NOT_FOUND)
                .append("method", call.signature())
                .append("created at", call.location());
            self.inner.t.error(&n.to_string());
        }
    }

    /// Dispatches an actual call and returns the configured values.
    ///
    /// An unexpected call, one call too many or unmet prerequisites fail the
    /// test through [`TestingT::fatal`].
    pub fn call(&self, method: &str, args: Arguments) -> Arguments {
        self.inner.t.helper();
        let outcome = {
            let mut s = lock(&self.inner.state);
            let backtrace = self
                .inner
                .stacks
                .then(|| Arc::new(Backtrace::force_capture()));
            let picked = select(&s.expected, method, &args)
                .and_then(|call| call.check_req(self.inner.id).map(|()| call));
            match picked {
                Ok(call) => {
                    s.calls.push(Invocation {
                        method: method.to_string(),
                        args: args.clone(),
                        backtrace,
                    });
                    let mut args = args;
                    Ok(call.invoke(&mut args))
                }
                Err(notice) => {
                    s.failed = true;
                    Err(notice)
                }
            }
        };
        match outcome {
            Ok(rets) => rets,
            Err(notice) => self.inner.t.fatal(&notice.to_string()),
        }
    }

    /// Runs selection only.
    pub fn callable(&self, method: &str, args: &Arguments) -> Result<(), String> {
        let s = lock(&self.inner.state);
        select(&s.expected, method, args)
            .map(|_| ())
            .map_err(|n| n.to_string())
    }

    pub fn failed(&self) -> bool {
        lock(&self.inner.state).failed
    }

    /// Recorded invocations in arrival order.
    pub fn calls(&self) -> Vec<Invocation> {
        lock(&self.inner.state).calls.clone()
    }

    /// Registered expectations in registration order.
    pub fn expected(&self) -> Vec<Call> {
        lock(&self.inner.state).expected.clone()
    }

    /// Stores a value in the mock's scratchpad.
    pub fn set_data(&self, key: impl Into<String>, v: impl IntoValue) {
        lock(&self.inner.state)
            .data
            .insert(key.into(), v.into_value());
    }

    pub fn data(&self, key: &str) -> Option<Value> {
        lock(&self.inner.state).data.get(key).cloned()
    }

    /// Verifies every expectation was satisfied, reporting the unmet ones as
    /// a test error. Runs once; later calls return the first verdict.
    pub fn assert_expectations(&self) -> bool {
        self.inner.t.helper();
        let notice = {
            let mut s = lock(&self.inner.state);
            if let Some(verdict) = s.audited {
                return verdict;
            }
            if s.failed {
                s.audited = Some(false);
                return false;
            }
            let unmet: Vec<(String, usize, usize)> = s
                .expected
                .iter()
                .filter(|c| !c.satisfied())
                .map(|c| (c.signature(), c.times_value().max(1), c.count()))
                .collect();
            if unmet.is_empty() {
                s.audited = Some(true);
                return true;
            }
            s.failed = true;
            s.audited = Some(false);
            let width = unmet.iter().map(|(sig, ..)| sig.len()).max().unwrap_or(0);
            unmet
                .into_iter()
                .fold(Notice::new(TOO_FEW_CALLS), |n, (sig, want, have)| {
                    n.line(format!(
                        "{sig:<width$}   expected {want} {} received {have} {}",
                        plural(want),
                        plural(have)
                    ))
                })
        };
        self.inner.t.error(&notice.to_string());
        false
    }

    /// Verifies `method` was invoked exactly `want` times.
    pub fn assert_call_count(&self, method: &str, want: usize) -> bool {
        self.inner.t.helper();
        let (have, signature) = {
            let s = lock(&self.inner.state);
            let have = s.calls.iter().filter(|c| c.method == method).count();
            let signature = match s.expected.iter().find(|c| c.method() == method) {
                Some(c) => c.signature(),
                None => actual_signature(method, &Arguments::new()),
            };
            (have, signature)
        };
        if have == want {
            return true;
        }
        let header = match have {
            0 => NEVER_CALLED,
            h if h < want => TOO_FEW_CALLS,
            _ => TOO_MANY_CALLS,
        };
        let n = Notice::new(header)
            .append("method", signature)
            .append("want", want)
            .append("have", have);
        self.inner.t.error(&n.to_string());
        false
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = lock(&self.inner.state);
        f.debug_struct("Mock")
            .field("id", &self.inner.id)
            .field("expected", &s.expected)
            .field("calls", &s.calls.len())
            .field("failed", &s.failed)
            .finish()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "call"
    } else {
        "calls"
    }
}
