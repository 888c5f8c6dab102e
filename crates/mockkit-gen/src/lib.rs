//! Generates trait mocks backed by the `mockkit-mock` runtime.
//!
//! [`Generator::generate`] resolves the source and target modules, parses
//! the trait and renders a mock type implementing it and all its
//! supertraits. Every method records its arguments and answers with the
//! returns configured on the embedded `Mock`.

pub mod emit;
pub mod generator;
pub mod imports;

pub use emit::EmitOptions;
pub use generator::{snake_case, Generated, Generator, Options, Output};
