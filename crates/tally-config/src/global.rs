//! Global Configuration (~/.tally/config.toml)
//!
//! Handles user-level defaults stored in `~/.tally/config.toml`. The file has
//! the same sections as `tally.toml`; any project value wins over it.

use crate::read_toml;
use crate::sections::{OutputConfig, RunConfig};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.tally/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default run settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,

    /// Default output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let config: Self = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            run.validate()?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.tally/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".tally").join("config.toml"))
    }
}
