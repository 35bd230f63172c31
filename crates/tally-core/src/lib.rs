//! Tally Core - hierarchical plan/pass/fail test protocol
//!
//! This library provides the pieces a tally run is built from:
//! - Test nodes with plan/pass/fail counters and upward notification
//! - The drain loop that starts queued children only once earlier work is
//!   fully resolved
//! - Assertion helpers (`ok`, `equal`, `deep_equal`, ...)
//! - The cooperative tick scheduler and per-node timeout guard
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use tally_core::{tick, Recorder, Test};
//!
//! tick::block_on(async {
//!     let recorder = Rc::new(Recorder::new());
//!     let root = Test::root(recorder.clone());
//!     root.test("addition", |t| {
//!         t.plan(1);
//!         t.equal(1 + 1, 2, "one plus one");
//!     });
//!     tokio::time::sleep(std::time::Duration::from_millis(1)).await;
//!     assert_eq!(recorder.passes().len(), 1);
//! })
//! .unwrap();
//! ```

/// Tally core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assert;
pub mod collaborator;
pub mod deep_equal;
pub mod failure;
pub mod node;
pub mod tick;

pub use collaborator::{Callbacks, Detached, Event, Parent, Recorder};
pub use deep_equal::deep_equal;
pub use failure::Failure;
pub use node::{Body, Counts, Test, DEFAULT_TIMEOUT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
