//! Run outcome types

use serde::Serialize;
use std::time::Duration;
use tally_core::{Failure, Test};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Every planned assertion passed
    Passed,
    /// An assertion failed, a node timed out, or a plan was violated
    Failed,
}

/// One failure, attributed to the node that raised it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Description of the failing node; `None` for the root
    pub test: Option<String>,
    /// Failure message
    pub message: String,
    /// Actual/expected rendering, when the assertion produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FailureRecord {
    pub fn new(origin: &Test, failure: &Failure) -> Self {
        Self {
            test: origin.description().map(str::to_string),
            message: failure.to_string(),
            detail: failure.detail().map(str::to_string),
        }
    }
}

/// Final state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: Status,
    /// Assertions planned anywhere in the tree
    pub planned: usize,
    /// Assertions passed anywhere in the tree
    pub passed: usize,
    pub failures: Vec<FailureRecord>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Report {
    /// Whether the process should exit successfully
    pub fn is_success(&self) -> bool {
        self.status == Status::Passed
    }
}
