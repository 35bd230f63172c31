//! Runner - drive one suite to completion

use crate::controller::RunController;
use crate::report::Report;
use crate::reporter::Reporter;
use crate::settings::RunSettings;
use anyhow::{Context, Result};
use std::io::Write;
use std::rc::Rc;
use tally_core::{tick, Test};
use tokio::task::LocalSet;
use tracing::debug;

/// Runs a suite body against a fresh root node
pub struct Runner {
    settings: RunSettings,
    writers: Option<(Box<dyn Write>, Box<dyn Write>)>,
}

impl Runner {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            writers: None,
        }
    }

    /// Send output to `out` (passes, summary) and `err` (failures) instead
    /// of stdout and stderr
    pub fn with_output(mut self, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        self.writers = Some((out, err));
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run `suite` on a new current-thread runtime and wait for the outcome
    pub fn run<F>(self, suite: F) -> Result<Report>
    where
        F: FnOnce(Test) + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the tally runtime")?;
        Ok(runtime.block_on(self.run_async(suite)))
    }

    /// Run `suite` on the current runtime.
    ///
    /// The run ends at the first failure, or once no scheduled work is left.
    pub async fn run_async<F>(self, suite: F) -> Report
    where
        F: FnOnce(Test) + 'static,
    {
        let reporter = match self.writers {
            Some((out, err)) => {
                Reporter::with_writers(out, err, self.settings.format, self.settings.color)
            }
            None => Reporter::new(self.settings.format, self.settings.color),
        };
        let controller = RunController::new(reporter);
        let root = Test::root(Rc::new(controller.clone()));
        root.set_timeout(self.settings.timeout);
        debug!(
            timeout_ms = self.settings.timeout.as_millis() as u64,
            format = %self.settings.format,
            "starting suite"
        );

        let local = LocalSet::new();
        local.spawn_local(async move {
            root.run(suite);
            tick::next_tick(move || root.serve());
        });

        tokio::select! {
            _ = controller.finished() => {}
            _ = local => controller.complete(),
        }
        controller.report()
    }
}
