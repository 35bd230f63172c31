//! Tally Harness - run tally suites as test binaries
//!
//! Wires a suite into a complete run:
//! - `RunController` as the root collaborator (totals, fail-fast, outcome)
//! - `Reporter` for pretty or JSON output
//! - `Args` + `tally-config` for settings, `tracing-subscriber` for logs
//! - `main` as the entry point of a `harness = false` test target
//!
//! # Example
//!
//! ```toml
//! [[test]]
//! name = "suite"
//! harness = false
//! ```
//!
//! ```no_run
//! fn main() -> std::process::ExitCode {
//!     tally_harness::main(|t| {
//!         t.test("addition", |t| {
//!             t.plan(1);
//!             t.equal(1 + 1, 2, "one plus one");
//!         });
//!     })
//! }
//! ```

pub mod args;
pub mod controller;
pub mod logging;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod settings;

pub use args::Args;
pub use controller::RunController;
pub use report::{FailureRecord, Report, Status};
pub use reporter::{Capture, Reporter};
pub use runner::Runner;
pub use settings::RunSettings;
pub use tally_core::Test;

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

/// Exit code for a configuration or setup error
pub const EXIT_SETUP_ERROR: u8 = 2;

/// Parse arguments, load configuration, run `suite` and map the outcome to
/// an exit code: 0 when every assertion passed, 1 on failure, 2 when the run
/// could not be set up.
pub fn main<F>(suite: F) -> ExitCode
where
    F: FnOnce(Test) + 'static,
{
    let args = Args::parse();
    logging::init(args.verbose);

    let outcome = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| RunSettings::load(&args, &cwd))
        .and_then(|settings| Runner::new(settings).run(suite));

    match outcome {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}
