//! Core support for mockkit.
//!
//! This crate provides the pieces shared by the runtime, the generator and the CLI:
//! - [`tester`]: The [`TestingT`](tester::TestingT) contract, [`TestContext`](tester::TestContext) for `#[test]` functions
//! - [`spy`]: A recording `TestingT` used to assert on reported failures
//! - [`golden`]: Golden-file loading (content after the `---` marker)
//! - [`textdiff`]: Line-oriented unified diffs
//! - [`must`]: Panic-on-error unwrappers
//! - [`config`]: Generator configuration loading from `mockkit.json`

pub mod config;
pub mod golden;
pub mod must;
pub mod spy;
pub mod tester;
pub mod textdiff;
