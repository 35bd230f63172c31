//! Project Configuration (tally.toml)
//!
//! Handles project-level configuration stored in `tally.toml` at the project root.

use crate::read_toml;
use crate::sections::{merge_section, OutputConfig, OutputFormat, RunConfig};
use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name searched for when walking up from the working directory
pub const PROJECT_CONFIG_FILE: &str = "tally.toml";

/// Project configuration from tally.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Run settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,

    /// Output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let config: Self = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            run.validate()?;
        }
        Ok(())
    }

    /// Configured timeout, if present
    pub fn timeout_ms(&self) -> Option<u64> {
        self.run.as_ref().and_then(|r| r.timeout_ms)
    }

    /// Configured output format, if present
    pub fn format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|o| o.format)
    }

    /// Configured color preference, if present
    pub fn color(&self) -> Option<bool> {
        self.output.as_ref().and_then(|o| o.color)
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        merge_section(&mut self.run, &other.run, RunConfig::merge);
        merge_section(&mut self.output, &other.output, OutputConfig::merge);
    }
}
