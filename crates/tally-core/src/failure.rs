//! Failure reasons carried up the `failed` chain

use thiserror::Error;

/// Why a node reported a failure.
///
/// Failures are values: they travel unchanged from the node where they
/// originate to the root collaborator, which alone decides what to do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Planned assertions were not all resolved before the node's deadline
    #[error("Timeout")]
    Timeout,
    /// An assertion resolved on a node that never declared a plan
    #[error("Always plan")]
    AlwaysPlan,
    /// More assertions resolved than were planned
    #[error("Passed/failed too many times")]
    TooManyTimes,
    /// The test body panicked before returning
    #[error("Panicked: {0}")]
    Panicked(String),
    /// An ordinary failed assertion
    #[error("{message}")]
    Assertion {
        message: String,
        detail: Option<String>,
    },
}

impl Failure {
    /// Build an assertion failure without extra detail
    pub fn assertion(message: impl Into<String>) -> Self {
        Failure::Assertion {
            message: message.into(),
            detail: None,
        }
    }

    /// Attach an explanation (e.g. an actual/expected rendering) to an
    /// assertion failure. Other variants are returned unchanged.
    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        match self {
            Failure::Assertion { message, .. } => Failure::Assertion {
                message,
                detail: Some(detail.into()),
            },
            other => other,
        }
    }

    /// Extra lines explaining an assertion failure
    pub fn detail(&self) -> Option<&str> {
        match self {
            Failure::Assertion { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure comes from the counting protocol itself rather
    /// than from an assertion made by the test author
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Failure::Timeout | Failure::AlwaysPlan | Failure::TooManyTimes
        )
    }
}
