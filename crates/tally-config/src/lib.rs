//! Tally Configuration System
//!
//! Provides run configuration for tally suites including:
//! - Project configuration (tally.toml)
//! - Global user configuration (~/.tally/config.toml)
//! - Environment overrides (TALLY_*, NO_COLOR)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tally/config.toml)
//! 2. Project config (./tally.toml)
//! 3. Environment variables (TALLY_*)
//! 4. CLI flags (applied by the harness)
//!
//! # Example
//!
//! ```no_run
//! use tally_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("timeout: {:?}", config.timeout());
//! ```

pub mod global;
pub mod loader;
pub mod project;
pub mod sections;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::ProjectConfig;
pub use sections::{OutputConfig, OutputFormat, RunConfig, DEFAULT_TIMEOUT_MS};

/// Read and parse a TOML config file
pub(crate) fn read_toml<T>(path: &Path) -> ConfigResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
        file: path.to_path_buf(),
        error: e,
    })
}
