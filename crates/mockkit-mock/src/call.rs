//! Expectations: what a mocked method is expected to receive and return.

use std::fmt;
use std::panic::Location;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockkit_core::tester::lock;

use crate::arguments::Arguments;
use crate::notice::{Notice, PREREQUISITES_NOT_MET, TOO_MANY_CALLS};
use crate::proxy::Proxy;

type Hook = Arc<dyn Fn(&mut Arguments) + Send + Sync>;
type Wait = Box<dyn FnMut() + Send>;

/// One expected method call.
///
/// A `Call` is a handle: the mock that created it keeps a clone, so the
/// builder methods configure the registered expectation.
///
/// ```
/// use mockkit_core::tester::TestContext;
/// use mockkit_mock::{args, Mock};
///
/// let ctx = TestContext::new("doc");
/// let mock = Mock::new(ctx.t());
/// mock.on("Get", args!["key"]).returns(args![42]).once();
/// assert_eq!(mock.call("Get", args!["key"]).int(0), 42);
/// ```
#[derive(Clone)]
pub struct Call {
    inner: Arc<CallInner>,
}

struct CallInner {
    mock_id: u64,
    method: String,
    location: &'static Location<'static>,
    state: Mutex<CallState>,
}

#[derive(Default)]
struct CallState {
    args: Option<Arguments>,
    any_args: bool,
    returns: Arguments,
    proxy: Option<Proxy>,
    times: usize,
    optional: bool,
    until: Option<Wait>,
    after: Option<Duration>,
    alters: Vec<Hook>,
    panic_msg: Option<String>,
    requires: Vec<Call>,
    count: usize,
}

impl Call {
    pub(crate) fn new(
        mock_id: u64,
        method: &str,
        args: Option<Arguments>,
        any_args: bool,
        proxy: Option<Proxy>,
        location: &'static Location<'static>,
    ) -> Self {
        if let Some(args) = &args {
            reject_functions(args);
        }
        Self {
            inner: Arc::new(CallInner {
                mock_id,
                method: method.to_string(),
                location,
                state: Mutex::new(CallState {
                    args,
                    any_args,
                    proxy,
                    ..CallState::default()
                }),
            }),
        }
    }

    /// Sets the values returned by each matching call.
    ///
    /// # Panics
    ///
    /// On a proxy-backed call.
    #[track_caller]
    pub fn returns(self, rets: Arguments) -> Self {
        {
            let mut s = lock(&self.inner.state);
            if s.proxy.is_some() {
                panic!("[mock] cannot set return values on a proxy-backed call");
            }
            s.returns = rets;
        }
        self
    }

    /// Sets the argument pattern of a proxy-backed call.
    ///
    /// # Panics
    ///
    /// On a call that is not proxy-backed, or when `args` holds a function.
    #[track_caller]
    pub fn with(self, args: Arguments) -> Self {
        reject_functions(&args);
        {
            let mut s = lock(&self.inner.state);
            if s.proxy.is_none() {
                panic!("[mock] with() is only valid on proxy-backed calls");
            }
            s.args = Some(args);
        }
        self
    }

    /// Expects exactly `n` calls. Zero means any number of calls, at least
    /// one.
    ///
    /// # Panics
    ///
    /// When the call is optional.
    #[track_caller]
    pub fn times(self, n: usize) -> Self {
        {
            let mut s = lock(&self.inner.state);
            if s.optional {
                panic!("[mock] optional() and times() are mutually exclusive");
            }
            s.times = n;
        }
        self
    }

    #[track_caller]
    pub fn once(self) -> Self {
        self.times(1)
    }

    #[track_caller]
    pub fn twice(self) -> Self {
        self.times(2)
    }

    /// Allows the call to never happen.
    ///
    /// # Panics
    ///
    /// When `times` was set.
    #[track_caller]
    pub fn optional(self) -> Self {
        {
            let mut s = lock(&self.inner.state);
            if s.times > 0 {
                panic!("[mock] optional() and times() are mutually exclusive");
            }
            s.optional = true;
        }
        self
    }

    /// Blocks each matching call until a message arrives on `rx` or its
    /// sender disconnects.
    pub fn until<T: Send + 'static>(self, rx: Receiver<T>) -> Self {
        {
            let mut s = lock(&self.inner.state);
            s.after = None;
            s.until = Some(Box::new(move || {
                let _ = rx.recv();
            }));
        }
        self
    }

    /// Delays each matching call by `d`.
    pub fn after(self, d: Duration) -> Self {
        {
            let mut s = lock(&self.inner.state);
            s.until = None;
            s.after = Some(d);
        }
        self
    }

    /// Adds a hook run on the actual arguments before returning. Hooks run
    /// in the order they were added.
    pub fn alter(self, f: impl Fn(&mut Arguments) + Send + Sync + 'static) -> Self {
        lock(&self.inner.state).alters.push(Arc::new(f));
        self
    }

    /// Makes each matching call panic with `msg`.
    ///
    /// # Panics
    ///
    /// On a proxy-backed call.
    #[track_caller]
    pub fn panics(self, msg: impl Into<String>) -> Self {
        {
            let mut s = lock(&self.inner.state);
            if s.proxy.is_some() {
                panic!("[mock] cannot set a panic value on a proxy-backed call");
            }
            s.panic_msg = Some(msg.into());
        }
        self
    }

    /// Requires every call in `calls` to be satisfied before this one may be
    /// invoked.
    pub fn requires(self, calls: &[&Call]) -> Self {
        lock(&self.inner.state)
            .requires
            .extend(calls.iter().map(|c| (*c).clone()));
        self
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Where the expectation was registered.
    pub fn location(&self) -> &'static Location<'static> {
        self.inner.location
    }

    /// Number of times the call was invoked.
    pub fn count(&self) -> usize {
        lock(&self.inner.state).count
    }

    pub fn is_optional(&self) -> bool {
        lock(&self.inner.state).optional
    }

    pub fn is_proxy(&self) -> bool {
        lock(&self.inner.state).proxy.is_some()
    }

    pub fn ptr_eq(&self, other: &Call) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn mock_id(&self) -> u64 {
        self.inner.mock_id
    }

    /// Whether the observed count satisfies the expectation.
    pub fn satisfied(&self) -> bool {
        lock(&self.inner.state).satisfied()
    }

    /// Method name and expected argument types, e.g. `Get(String, i32)`.
    pub fn signature(&self) -> String {
        let s = lock(&self.inner.state);
        self.signature_of(&s)
    }

    fn signature_of(&self, s: &CallState) -> String {
        if let (Some(p), None) = (&s.proxy, &s.args) {
            return p.signature();
        }
        match &s.args {
            _ if s.any_args => format!("{}(...)", self.inner.method),
            Some(args) => format!("{}({})", self.inner.method, args.type_names().join(", ")),
            None => format!("{}()", self.inner.method),
        }
    }

    /// Expected call count, or zero when unconstrained.
    pub(crate) fn times_value(&self) -> usize {
        lock(&self.inner.state).times
    }

    /// Expected arguments, `None` for any arguments.
    pub(crate) fn pattern(&self) -> Option<Arguments> {
        let s = lock(&self.inner.state);
        if s.any_args {
            None
        } else {
            s.args.clone()
        }
    }

    pub(crate) fn accepts_any(&self) -> bool {
        let s = lock(&self.inner.state);
        s.any_args || (s.proxy.is_some() && s.args.is_none())
    }

    /// Fails when one more invocation would exceed `times`.
    pub fn can_call(&self) -> Result<(), Notice> {
        let s = lock(&self.inner.state);
        if s.times > 0 && s.count >= s.times {
            let mut n = Notice::new(TOO_MANY_CALLS).append("method", self.signature_of(&s));
            if let Some(args) = s.args.as_ref().filter(|_| !s.any_args) {
                n = n.append("args", render_args(args));
            }
            return Err(n.append("want", s.times).append("have", s.count + 1));
        }
        Ok(())
    }

    /// Checks that every prerequisite is satisfied. `mock_id` identifies the
    /// mock dispatching the call.
    pub(crate) fn check_req(&self, mock_id: u64) -> Result<(), Notice> {
        let requires = lock(&self.inner.state).requires.clone();
        let unmet: Vec<&Call> = requires.iter().filter(|r| !r.satisfied()).collect();
        if unmet.is_empty() {
            return Ok(());
        }
        let mut n = Notice::new(PREREQUISITES_NOT_MET).append("method", self.signature());
        for r in unmet {
            let owner = if r.mock_id() == mock_id {
                "the same mock"
            } else {
                "a different mock"
            };
            n = n
                .append("requires", format!("{} ({owner})", r.signature()))
                .append("created at", r.location());
        }
        Err(n)
    }

    /// Runs one invocation: count it, wait, panic or alter the arguments,
    /// then produce the return values.
    pub(crate) fn invoke(&self, args: &mut Arguments) -> Arguments {
        let (mut until, after, panic_msg, alters) = {
            let mut s = lock(&self.inner.state);
            s.count += 1;
            (s.until.take(), s.after, s.panic_msg.clone(), s.alters.clone())
        };
        if let Some(mut wait) = until.take() {
            wait();
            let mut s = lock(&self.inner.state);
            if s.until.is_none() {
                s.until = Some(wait);
            }
        } else if let Some(d) = after {
            std::thread::sleep(d);
        }
        if let Some(msg) = panic_msg {
            panic!("{msg}");
        }
        for hook in &alters {
            hook(args);
        }
        let (proxy, returns) = {
            let s = lock(&self.inner.state);
            (s.proxy.clone(), s.returns.clone())
        };
        match proxy {
            Some(p) => p.call(args),
            None => returns,
        }
    }
}

impl CallState {
    fn satisfied(&self) -> bool {
        if self.optional {
            return self.times == 0 || self.count <= self.times;
        }
        if self.times > 0 {
            self.count == self.times
        } else {
            self.count >= 1
        }
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("signature", &self.signature())
            .field("count", &self.count())
            .field("location", &self.inner.location)
            .finish()
    }
}

fn render_args(args: &Arguments) -> String {
    args.iter()
        .map(|v| v.render())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Functions cannot be compared and would shadow matchers.
#[track_caller]
fn reject_functions(args: &Arguments) {
    if let Some(i) = args.iter().position(|v| v.is_function()) {
        panic!(
            "[mock] argument {i} is a function: functions cannot be expected arguments, use a matcher"
        );
    }
}
