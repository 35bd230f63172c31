//! Root collaborator for a run
//!
//! The root node reports to a `RunController`, which keeps the run-wide
//! totals and decides how the run ends:
//! - every pass is counted and printed under its introduced ancestors
//! - the first failure ends the run as failed; later events are ignored
//! - a `serve` poke from the drained root marks the run ready on the next
//!   tick, once the totals balance
//! - when no scheduled work is left, [`RunController::complete`] ends the run
//!   as passed if the totals balance

use crate::report::{FailureRecord, Report, Status};
use crate::reporter::Reporter;
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::Instant;
use tally_core::{tick, Failure, Parent, Test};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

struct RunState {
    planned: Cell<usize>,
    passed: Cell<usize>,
    ready: Cell<bool>,
    failures: RefCell<Vec<FailureRecord>>,
    reporter: RefCell<Reporter>,
    status: Cell<Option<Status>>,
    started: Instant,
    settled: Notify,
}

/// Owns the state of one run. Clones share it.
#[derive(Clone)]
pub struct RunController {
    state: Rc<RunState>,
}

impl RunController {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            state: Rc::new(RunState {
                planned: Cell::new(0),
                passed: Cell::new(0),
                ready: Cell::new(false),
                failures: RefCell::new(Vec::new()),
                reporter: RefCell::new(reporter),
                status: Cell::new(None),
                started: Instant::now(),
                settled: Notify::new(),
            }),
        }
    }

    /// Outcome, once the run has settled
    pub fn status(&self) -> Option<Status> {
        self.state.status.get()
    }

    /// Whether the drained root has been seen with balanced totals
    pub fn is_ready(&self) -> bool {
        self.state.ready.get()
    }

    /// End the run once nothing is left to schedule.
    ///
    /// Has no effect when a failure already settled the run.
    pub fn complete(&self) {
        let state = &self.state;
        let balanced = state.planned.get() == state.passed.get();
        if !balanced {
            warn!(
                planned = state.planned.get(),
                passed = state.passed.get(),
                "run went idle with assertions outstanding"
            );
        }
        self.settle(if balanced {
            Status::Passed
        } else {
            Status::Failed
        });
    }

    /// Wait until the run settles
    pub async fn finished(&self) -> Status {
        loop {
            if let Some(status) = self.state.status.get() {
                return status;
            }
            self.state.settled.notified().await;
        }
    }

    /// Snapshot of the run so far
    pub fn report(&self) -> Report {
        Report {
            status: self.state.status.get().unwrap_or(Status::Failed),
            planned: self.state.planned.get(),
            passed: self.state.passed.get(),
            failures: self.state.failures.borrow().clone(),
            elapsed: self.state.started.elapsed(),
        }
    }

    fn settle(&self, status: Status) {
        if self.state.status.get().is_some() {
            return;
        }
        self.state.status.set(Some(status));
        let report = self.report();
        info!(
            ?status,
            planned = report.planned,
            passed = report.passed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run settled"
        );
        emit(self.state.reporter.borrow_mut().finish(&report));
        self.state.settled.notify_one();
    }

    fn check_balanced(&self) {
        let state = &self.state;
        if state.status.get().is_some() || state.ready.get() {
            return;
        }
        if state.planned.get() == state.passed.get() {
            state.ready.set(true);
            debug!(passed = state.passed.get(), "root balanced");
        } else {
            debug!(
                planned = state.planned.get(),
                passed = state.passed.get(),
                "root drained with assertions outstanding"
            );
        }
    }
}

impl Parent for RunController {
    fn planned(&self, _origin: &Test, count: usize) {
        self.state.planned.set(self.state.planned.get() + count);
    }

    fn passed(&self, origin: &Test, message: &str) {
        if self.state.status.get().is_some() {
            return;
        }
        self.state.passed.set(self.state.passed.get() + 1);
        let mut reporter = self.state.reporter.borrow_mut();
        emit(reporter.introduce(&origin.introduce()));
        emit(reporter.pass(origin, message));
    }

    fn failed(&self, origin: &Test, failure: &Failure) {
        if self.state.status.get().is_some() {
            debug!(node = origin.id(), %failure, "failure after the run settled");
            return;
        }
        debug!(
            node = origin.id(),
            test = origin.description().unwrap_or_default(),
            protocol = failure.is_protocol_violation(),
            %failure,
            "assertion failed"
        );
        self.state
            .failures
            .borrow_mut()
            .push(FailureRecord::new(origin, failure));
        {
            let mut reporter = self.state.reporter.borrow_mut();
            emit(reporter.introduce(&origin.introduce()));
            emit(reporter.failure(origin, failure));
        }
        self.settle(Status::Failed);
    }

    fn serve(&self) {
        let controller = self.clone();
        tick::next_tick(move || controller.check_balanced());
    }
}

fn emit(result: io::Result<()>) {
    if let Err(e) = result {
        warn!(error = %e, "failed to write test output");
    }
}
