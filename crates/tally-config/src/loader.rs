//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{ProjectConfig, PROJECT_CONFIG_FILE};
use crate::sections::{
    validate_timeout, OutputConfig, OutputFormat, RunConfig, DEFAULT_TIMEOUT_MS,
};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tally/config.toml) - lowest priority
/// 2. Project config (./tally.toml) - overrides global
/// 3. Environment variables (TALLY_*, NO_COLOR) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tally.toml was found)
    pub project_root: Option<PathBuf>,

    /// Why the global config was skipped, when it exists but failed to load
    pub global_error: Option<String>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global defaults from `path` instead of ~/.tally/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tally.toml, then loads and merges
    /// global config if it exists. A global config that fails to load is
    /// replaced by defaults and its error kept in [`Config::global_error()`].
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let (global_config, global_error) = self.load_global_config_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
            global_error,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let (global_config, global_error) = self.load_global_config_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
            global_error,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); both default when no tally.toml exists
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Global config, or defaults plus the reason it could not be used
    fn load_global_config_or_default(&mut self) -> (GlobalConfig, Option<String>) {
        match self.load_global_config() {
            Ok(global) => (global, None),
            Err(e) => (GlobalConfig::default(), Some(e.to_string())),
        }
    }

    /// Load global configuration from ~/.tally/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// - `TALLY_TIMEOUT_MS=<ms>` sets `run.timeout_ms`
    /// - `TALLY_FORMAT=pretty|json` sets `output.format`
    /// - `TALLY_NO_COLOR=1` or a non-empty `NO_COLOR` disables color
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(timeout) = env::var("TALLY_TIMEOUT_MS") {
            let timeout_ms = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "TALLY_TIMEOUT_MS".to_string(),
                    reason: format!("'{}' is not a number of milliseconds: {}", timeout, e),
                })?;
            validate_timeout("TALLY_TIMEOUT_MS", Some(timeout_ms))?;
            config
                .run
                .get_or_insert_with(RunConfig::default)
                .timeout_ms = Some(timeout_ms);
        }

        if let Ok(format) = env::var("TALLY_FORMAT") {
            let format: OutputFormat = format.trim().parse()?;
            config
                .output
                .get_or_insert_with(OutputConfig::default)
                .format = Some(format);
        }

        if color_disabled_by_env() {
            config
                .output
                .get_or_insert_with(OutputConfig::default)
                .color = Some(false);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn color_disabled_by_env() -> bool {
    let no_color = env::var("NO_COLOR").is_ok_and(|v| !v.is_empty());
    let tally_no_color = env::var("TALLY_NO_COLOR")
        .is_ok_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"));
    no_color || tally_no_color
}

impl Config {
    /// Global values overlaid with project (and environment) values
    pub fn effective(&self) -> ProjectConfig {
        let mut merged = ProjectConfig {
            run: self.global.run.clone(),
            output: self.global.output.clone(),
        };
        merged.merge(&self.project);
        merged
    }

    /// Effective per-node timeout (project > global > default)
    pub fn timeout(&self) -> Duration {
        let ms = self.effective().timeout_ms().unwrap_or(DEFAULT_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    /// Effective output format (project > global > pretty)
    pub fn format(&self) -> OutputFormat {
        self.effective().format().unwrap_or_default()
    }

    /// Effective color preference (project > global > enabled)
    pub fn color(&self) -> bool {
        self.effective().color().unwrap_or(true)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tally.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Error that caused the global config to be ignored
    pub fn global_error(&self) -> Option<&str> {
        self.global_error.as_deref()
    }
}
