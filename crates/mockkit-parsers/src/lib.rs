//! Locating and reading the traits mocks are generated from.
//!
//! [`package::Resolver`] maps file paths and module paths to modules,
//! [`interface::parse_interface`] reads a trait with tree-sitter and
//! resolves every type it mentions for the module the mock is written into.

pub mod cargo;
pub mod error;
pub mod imports;
pub mod interface;
pub mod mod_resolution;
pub mod package;
pub mod treesitter;
pub mod types;

pub use error::GenError;
pub use imports::Import;
pub use interface::{parse_interface, Interface, Method, Param, ParseOptions, TraitImpl};
pub use package::{Package, Resolver};
pub use types::{Capture, Mode, Ty};
