use std::path::PathBuf;

use crate::treesitter::ParseError;

/// Errors returned while resolving packages and parsing traits.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("unknown package {spec}{}", detail_suffix(.detail))]
    UnknownPackage {
        spec: String,
        /// Stderr of `cargo metadata` when it failed.
        detail: Option<String>,
    },
    #[error("unknown type {name} in {module}")]
    UnknownType { name: String, module: String },
    #[error("unknown trait {name} in {module}")]
    UnknownInterface { name: String, module: String },
    #[error("unknown method {method} in trait {interface}")]
    UnknownMethod { interface: String, method: String },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("invalid import spec {0:?}")]
    InvalidImportSpec(String),
    #[error("trait {0} has no methods")]
    NoMethods(String),
    #[error("invalid import {path} in {module}")]
    InvalidImportInstance { path: String, module: String },
    #[error("{} is not inside a cargo package", .0.display())]
    NotInModule(PathBuf),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.trim().is_empty() => format!(": {}", d.trim()),
        _ => String::new(),
    }
}
