//! Effective run settings: configuration overlaid with command-line flags

use crate::args::Args;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tally_config::{Config, ConfigLoader, OutputFormat};
use tracing::warn;

/// Everything a [`crate::Runner`] needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Deadline armed by every `plan` call
    pub timeout: Duration,
    pub format: OutputFormat,
    pub color: bool,
    pub verbose: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunSettings {
    /// Settings from configuration alone
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.timeout(),
            format: config.format(),
            color: config.color(),
            verbose: false,
        }
    }

    /// Apply command-line flags on top of configuration
    pub fn resolve(config: &Config, args: &Args) -> Self {
        let mut settings = Self::from_config(config);
        if let Some(ms) = args.timeout {
            settings.timeout = Duration::from_millis(ms);
        }
        if let Some(format) = args.format {
            settings.format = format;
        }
        if args.no_color {
            settings.color = false;
        }
        settings.verbose = args.verbose;
        settings
    }

    /// Load configuration for `args` and resolve it.
    ///
    /// Uses `--config` when given, otherwise the nearest tally.toml above
    /// `start_dir`.
    pub fn load(args: &Args, start_dir: &Path) -> Result<Self> {
        if args.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than zero");
        }

        let mut loader = ConfigLoader::new();
        let config = match &args.config {
            Some(path) => loader
                .load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => loader
                .load_from_directory(start_dir)
                .with_context(|| format!("Failed to load config for {}", start_dir.display()))?,
        };
        if let Some(error) = config.global_error() {
            warn!(%error, "ignoring global config");
        }
        Ok(Self::resolve(&config, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tally_config::{OutputConfig, ProjectConfig, RunConfig};
    use tempfile::TempDir;

    fn json_project() -> Config {
        Config {
            project: ProjectConfig {
                run: Some(RunConfig {
                    timeout_ms: Some(80),
                }),
                output: Some(OutputConfig {
                    format: Some(OutputFormat::Json),
                    color: None,
                }),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = RunSettings::default();
        assert_eq!(settings.timeout, Duration::from_millis(5000));
        assert_eq!(settings.format, OutputFormat::Pretty);
        assert!(settings.color);
    }

    #[test]
    fn test_config_without_flags() {
        let settings = RunSettings::resolve(&json_project(), &Args::default());
        assert_eq!(settings.timeout, Duration::from_millis(80));
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args {
            timeout: Some(10),
            format: Some(OutputFormat::Pretty),
            no_color: true,
            verbose: true,
            ..Default::default()
        };

        let settings = RunSettings::resolve(&json_project(), &args);
        assert_eq!(
            settings,
            RunSettings {
                timeout: Duration::from_millis(10),
                format: OutputFormat::Pretty,
                color: false,
                verbose: true,
            }
        );
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ci.toml");
        fs::write(&path, "[run]\ntimeout_ms = 33\n").unwrap();

        let args = Args {
            config: Some(path),
            ..Default::default()
        };
        let settings = RunSettings::load(&args, dir.path()).unwrap();
        assert_eq!(settings.timeout, Duration::from_millis(33));
    }

    #[test]
    fn test_load_missing_config_file_errors() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };

        let err = RunSettings::load(&args, dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config from"));
    }

    #[test]
    #[serial]
    fn test_no_color_env_disables_color() {
        let dir = TempDir::new().unwrap();
        env::set_var("NO_COLOR", "1");
        let loaded = Args::try_parse_from(["tally"])
            .map_err(anyhow::Error::from)
            .and_then(|args| RunSettings::load(&args, dir.path()));
        env::remove_var("NO_COLOR");

        assert!(!loaded.unwrap().color);
    }

    #[test]
    fn test_zero_timeout_flag_rejected() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            timeout: Some(0),
            ..Default::default()
        };
        assert!(RunSettings::load(&args, dir.path()).is_err());
    }
}
