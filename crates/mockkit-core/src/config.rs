//! Configuration file loading for mockkit.
//!
//! Reads `mockkit.json` and provides the generator defaults plus the list of
//! mocks regenerated by `mockkit batch`. Missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "mockkit.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level mockkit configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MockkitConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub mocks: Vec<MockSpec>,
}

/// Settings shared by every generated mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Alias under which the tester module is imported, if any.
    #[serde(default)]
    pub tester_alias: Option<String>,
    #[serde(default)]
    pub on_helpers: bool,
    /// Treat a trailing `&[T]` parameter as variadic.
    #[serde(default)]
    pub variadic_slices: bool,
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
    #[serde(default = "default_tester_path")]
    pub tester_path: String,
}

/// One entry of the batch list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockSpec {
    pub src: String,
    pub dst: String,
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Output file, `-` for stdout. Defaults to the snake-cased mock name
    /// in the target module's child directory.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
    /// Overrides `generator.on_helpers` for this entry.
    #[serde(default)]
    pub on_helpers: Option<bool>,
}

fn default_runtime_crate() -> String {
    "mockkit_mock".to_string()
}
fn default_tester_path() -> String {
    "mockkit_core::tester".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tester_alias: None,
            on_helpers: false,
            variadic_slices: false,
            runtime_crate: default_runtime_crate(),
            tester_path: default_tester_path(),
        }
    }
}

impl MockkitConfig {
    /// Load configuration from `mockkit.json` inside `dir`.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("{e}, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file, reporting every failure.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MockSpec {
    /// Whether `on_<name>` helpers are emitted for this entry.
    pub fn on_helpers(&self, generator: &GeneratorConfig) -> bool {
        self.on_helpers.unwrap_or(generator.on_helpers)
    }
}
