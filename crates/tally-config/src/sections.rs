//! Configuration sections shared by tally.toml and ~/.tally/config.toml
//!
//! ```toml
//! [run]
//! timeout_ms = 5000
//!
//! [output]
//! format = "pretty"   # or "json"
//! color = true
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-node timeout used when nothing is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// `[run]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Deadline armed by every `plan` call, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Report format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Colorize pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// How results are reported
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented, colored line per assertion
    #[default]
    Pretty,
    /// One JSON summary object at the end of the run
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "output.format".to_string(),
                reason: format!("must be 'pretty' or 'json', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl RunConfig {
    /// Validate the run section
    pub fn validate(&self) -> ConfigResult<()> {
        validate_timeout("run.timeout_ms", self.timeout_ms)
    }

    /// Take every value `other` sets
    pub fn merge(&mut self, other: &RunConfig) {
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

impl OutputConfig {
    /// Take every value `other` sets
    pub fn merge(&mut self, other: &OutputConfig) {
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
    }
}

/// Reject a zero timeout
pub(crate) fn validate_timeout(field: &str, timeout_ms: Option<u64>) -> ConfigResult<()> {
    if timeout_ms == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Merge optional sections, creating the base section when needed
pub(crate) fn merge_section<T, F>(base: &mut Option<T>, other: &Option<T>, merge: F)
where
    T: Clone + Default,
    F: FnOnce(&mut T, &T),
{
    if let Some(other) = other {
        merge(base.get_or_insert_with(T::default), other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pretty", OutputFormat::Pretty)]
    #[case("json", OutputFormat::Json)]
    #[case("JSON", OutputFormat::Json)]
    fn test_parse_format(#[case] input: &str, #[case] expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_format() {
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("'xml'"));
    }

    #[test]
    fn test_format_display_matches_toml_spelling() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::default(), OutputFormat::Pretty);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let run = RunConfig {
            timeout_ms: Some(0),
        };
        assert!(run.validate().is_err());
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_output_merge_keeps_unset_fields() {
        let mut base = OutputConfig {
            format: Some(OutputFormat::Json),
            color: Some(true),
        };
        base.merge(&OutputConfig {
            format: None,
            color: Some(false),
        });
        assert_eq!(base.format, Some(OutputFormat::Json));
        assert_eq!(base.color, Some(false));
    }

    #[test]
    fn test_merge_section_creates_base() {
        let mut base: Option<RunConfig> = None;
        merge_section(
            &mut base,
            &Some(RunConfig {
                timeout_ms: Some(10),
            }),
            RunConfig::merge,
        );
        assert_eq!(base.and_then(|r| r.timeout_ms), Some(10));
    }
}
