//! Shared helpers for tally-core integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tally_core::{Recorder, Test};
use tokio::task::LocalSet;

/// Run `future` on a paused current-thread runtime inside a `LocalSet`.
///
/// Timers auto-advance once every queued tick has run, so deadlines resolve
/// instantly and deterministically.
pub fn run_paused<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();
    LocalSet::new().block_on(&runtime, future)
}

/// Let every tick queued so far (and any they queue) run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Advance the paused clock by `ms`
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// A root whose notifications land in a recorder
pub fn recorded_root() -> (Rc<Recorder>, Test) {
    let recorder = Rc::new(Recorder::new());
    let root = Test::root(recorder.clone());
    (recorder, root)
}

/// Shared slot test bodies can push their handle into
pub type Handles = Rc<RefCell<Vec<Test>>>;

pub fn handles() -> Handles {
    Rc::new(RefCell::new(Vec::new()))
}

/// Find a captured handle by description
pub fn by_description(handles: &Handles, description: &str) -> Test {
    handles
        .borrow()
        .iter()
        .find(|t| t.description() == Some(description))
        .cloned()
        .unwrap_or_else(|| panic!("no test named {description}"))
}
