//! Command-line arguments for `harness = false` suite binaries

use clap::Parser;
use std::path::PathBuf;
use tally_config::OutputFormat;

/// Run a tally suite
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tally", version, about)]
pub struct Args {
    /// Per-node timeout in milliseconds
    #[arg(long, value_name = "MS", env = "TALLY_TIMEOUT_MS")]
    pub timeout: Option<u64>,

    /// Output format (pretty, json)
    #[arg(long, value_name = "FORMAT", env = "TALLY_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Disable colored output (`NO_COLOR` is read with the configuration)
    #[arg(long)]
    pub no_color: bool,

    /// Project config file (defaults to the nearest tally.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    // Flags `cargo test` may forward to test binaries; accepted and ignored
    #[arg(long, hide = true)]
    pub nocapture: bool,

    #[arg(long, hide = true, value_name = "N")]
    pub test_threads: Option<usize>,

    #[arg(long, short = 'q', hide = true)]
    pub quiet: bool,

    #[arg(long, hide = true)]
    pub exact: bool,

    #[arg(hide = true)]
    pub filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tally"]).unwrap();
        assert_eq!(args.timeout, None);
        assert_eq!(args.format, None);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "tally",
            "--timeout",
            "250",
            "--format",
            "json",
            "--no-color",
            "--config",
            "ci/tally.toml",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.timeout, Some(250));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.no_color);
        assert_eq!(args.config, Some(PathBuf::from("ci/tally.toml")));
        assert!(args.verbose);
    }

    #[rstest]
    #[case(&["tally", "--nocapture"])]
    #[case(&["tally", "--test-threads", "1"])]
    #[case(&["tally", "--quiet"])]
    #[case(&["tally", "some_filter", "--exact"])]
    fn test_libtest_flags_accepted(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_ok());
    }

    #[rstest]
    #[case("1")]
    #[case("yes")]
    #[case("true")]
    #[serial]
    fn test_no_color_env_does_not_break_parsing(#[case] value: &str) {
        env::set_var("NO_COLOR", value);
        let parsed = Args::try_parse_from(["tally"]);
        env::remove_var("NO_COLOR");

        let args = parsed.unwrap();
        assert!(!args.no_color);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Args::try_parse_from(["tally", "--format", "tap"]).is_err());
    }
}
