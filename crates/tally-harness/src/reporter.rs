//! Reporter - display assertion results
//!
//! Pretty output mirrors the shape of the test tree:
//!
//! ```text
//!
//!  addition
//!  ✔︎ one plus one
//!
//!   nested
//!    ✔︎ inner check
//!
//! ♥︎ All tests passed! ♥︎
//! ```
//!
//! Failures go to the error sink as `✗ message`, followed by any detail lines.
//! JSON output stays silent until the run settles, then prints one summary
//! object.

use crate::report::Report;
use colored::{Color, Colorize};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use tally_config::OutputFormat;
use tally_core::{Failure, Test};

/// Writes run output in the configured format
pub struct Reporter {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    format: OutputFormat,
    color: bool,
}

impl Reporter {
    /// Report to stdout (passes, summary) and stderr (failures)
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()), format, color)
    }

    /// Report to arbitrary sinks
    pub fn with_writers(
        out: Box<dyn Write>,
        err: Box<dyn Write>,
        format: OutputFormat,
        color: bool,
    ) -> Self {
        Self {
            out,
            err,
            format,
            color,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print a header for each newly introduced node that has a description
    pub fn introduce(&mut self, chain: &[Test]) -> io::Result<()> {
        if self.format != OutputFormat::Pretty {
            return Ok(());
        }
        for test in chain {
            if let Some(description) = test.description() {
                writeln!(self.out)?;
                writeln!(self.out, "{} {}", indent(test.depth()), description)?;
            }
        }
        Ok(())
    }

    /// Print one passing assertion
    pub fn pass(&mut self, origin: &Test, message: &str) -> io::Result<()> {
        if self.format != OutputFormat::Pretty {
            return Ok(());
        }
        let line = self.paint(&format!(" ✔︎ {}", message), Color::Green);
        writeln!(self.out, "{}{}", indent(origin.depth()), line)
    }

    /// Print one failure and its detail lines
    pub fn failure(&mut self, origin: &Test, failure: &Failure) -> io::Result<()> {
        if self.format != OutputFormat::Pretty {
            return Ok(());
        }
        let prefix = indent(origin.depth());
        let line = self.paint(&format!("✗ {}", failure), Color::Red);
        writeln!(self.err, "{}{}", prefix, line)?;
        if let Some(detail) = failure.detail() {
            for detail_line in detail.lines() {
                let detail_line = if self.color {
                    detail_line.dimmed().to_string()
                } else {
                    detail_line.to_string()
                };
                writeln!(self.err, "{}{}", prefix, detail_line)?;
            }
        }
        self.err.flush()
    }

    /// Print the end-of-run summary
    pub fn finish(&mut self, report: &Report) -> io::Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                if report.is_success() {
                    writeln!(self.out)?;
                    let line = self.paint("♥︎ All tests passed! ♥︎", Color::Green);
                    writeln!(self.out, "{}", line)?;
                }
            }
            OutputFormat::Json => {
                let summary = serde_json::json!({
                    "planned": report.planned,
                    "passed": report.passed,
                    "failed": report.failures.len(),
                    "status": report.status,
                    "failures": report.failures,
                });
                writeln!(self.out, "{}", summary)?;
            }
        }
        self.out.flush()
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Two spaces per depth level; the root and its direct children are flush
fn indent(depth: i32) -> String {
    "  ".repeat(depth.max(0) as usize)
}

/// In-memory sink that stays readable after a clone is handed to a reporter
#[derive(Debug, Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FailureRecord, Status};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::time::Duration;
    use tally_core::Detached;

    fn reporter(format: OutputFormat) -> (Capture, Capture, Reporter) {
        let (out, err) = (Capture::new(), Capture::new());
        let reporter =
            Reporter::with_writers(Box::new(out.clone()), Box::new(err.clone()), format, false);
        (out, err, reporter)
    }

    fn report(status: Status, failures: Vec<FailureRecord>) -> Report {
        Report {
            status,
            planned: 2,
            passed: 2,
            failures,
            elapsed: Duration::ZERO,
        }
    }

    #[rstest]
    #[case(-1, "")]
    #[case(0, "")]
    #[case(1, "  ")]
    #[case(3, "      ")]
    fn test_indent(#[case] depth: i32, #[case] expected: &str) {
        assert_eq!(indent(depth), expected);
    }

    #[test]
    fn test_pretty_pass_and_summary() {
        let (out, err, mut reporter) = reporter(OutputFormat::Pretty);
        let root = Test::root(std::rc::Rc::new(Detached));

        reporter.pass(&root, "ok").unwrap();
        reporter.finish(&report(Status::Passed, vec![])).unwrap();

        assert_eq!(out.contents(), " ✔︎ ok\n\n♥︎ All tests passed! ♥︎\n");
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn test_pretty_failure_with_detail() {
        let (out, err, mut reporter) = reporter(OutputFormat::Pretty);
        let root = Test::root(std::rc::Rc::new(Detached));
        let failure = Failure::assertion("sum").with_detail("  Actual:   1\n  Expected: 2");

        reporter.failure(&root, &failure).unwrap();
        reporter.finish(&report(Status::Failed, vec![])).unwrap();

        assert_eq!(err.contents(), "✗ sum\n  Actual:   1\n  Expected: 2\n");
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_json_prints_only_summary() {
        let (out, err, mut reporter) = reporter(OutputFormat::Json);
        let root = Test::root(std::rc::Rc::new(Detached));

        reporter.introduce(&root.introduce()).unwrap();
        reporter.pass(&root, "ok").unwrap();
        reporter.failure(&root, &Failure::Timeout).unwrap();
        let failures = vec![FailureRecord::new(&root, &Failure::Timeout)];
        reporter.finish(&report(Status::Failed, failures)).unwrap();

        let value: serde_json::Value = serde_json::from_str(out.contents().trim()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "planned": 2,
                "passed": 2,
                "failed": 1,
                "status": "failed",
                "failures": [{"test": null, "message": "Timeout"}],
            })
        );
        assert_eq!(err.contents(), "");
    }
}
