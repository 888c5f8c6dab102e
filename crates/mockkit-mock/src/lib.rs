//! Expectation-driven mock runtime.
//!
//! A [`Mock`] records expected calls, registered with [`Mock::on`],
//! [`Mock::on_any`] or [`Mock::proxy`], and answers actual calls dispatched
//! through [`Mock::call`]. Generated trait mocks (see `mockkit-gen`) are thin
//! wrappers forwarding each trait method to a `Mock`.
//!
//! - [`value`]: dynamically typed argument and return values
//! - [`arguments`]: argument lists and positional diffs
//! - [`matcher`]: predicates standing in for expected arguments
//! - [`call`]: expectations and their builders
//! - [`proxy`]: functions answering calls in place of fixed returns
//! - [`notice`]: structured failure messages
//! - [`autoref`]: capture and extraction helpers for generated code
//!
//! ```
//! use mockkit_core::tester::TestContext;
//! use mockkit_mock::{args, Matcher, Mock};
//!
//! let ctx = TestContext::new("example");
//! let mock = Mock::new(ctx.t());
//! mock.on("Len", args![Matcher::by(|s: &String| s.len() > 3)])
//!     .returns(args![true])
//!     .once();
//!
//! assert!(mock.call("Len", args!["long"]).bool(0));
//! assert!(ctx.finish().is_empty());
//! ```

pub mod arguments;
pub mod autoref;
pub mod call;
pub mod matcher;
pub mod mock;
pub mod notice;
pub mod proxy;
mod selector;
pub mod value;

pub use arguments::{ArgsDiff, Arguments};
pub use call::Call;
pub use matcher::Matcher;
pub use mock::{Invocation, Mock};
pub use notice::Notice;
pub use proxy::{Proxy, ProxyFn, VariadicFn};
pub use value::{short_type_name, Data, ErrorValue, FuncValue, IntoValue, Value, ANY};

/// The test-manager contract mocks report through.
pub use mockkit_core::tester;
