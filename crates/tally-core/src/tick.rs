//! Cooperative tick scheduling for tally
//!
//! All deferred work runs on a tokio current-thread runtime inside a
//! `LocalSet`:
//! - `next_tick` queues a closure behind everything already scheduled (FIFO)
//! - `Guard` arms a one-shot deadline that can be cleared before it fires
//! - `block_on` / `run_local` bridge synchronous and async callers into the
//!   local set
//!
//! Nodes are `Rc`-shared, so nothing here is `Send`: every task is spawned
//! with `spawn_local` and stays on the thread that drives the run.

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::task::{AbortHandle, LocalSet};

/// Schedule `f` to run after the current synchronous scope completes.
///
/// Work scheduled this way runs in the order it was scheduled. Must be called
/// from within a `LocalSet` (see [`block_on`] and [`run_local`]).
pub fn next_tick<F>(f: F)
where
    F: FnOnce() + 'static,
{
    tokio::task::spawn_local(async move { f() });
}

/// Block on a future inside a fresh current-thread runtime and `LocalSet`.
///
/// Each call gets its own runtime so separate runs never share timers or
/// queued ticks.
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local_set = LocalSet::new();
    Ok(local_set.block_on(&runtime, future))
}

/// Drive `future` inside a new `LocalSet` on the current runtime.
///
/// Use this from an existing async context (e.g. `#[tokio::test]`).
pub async fn run_local<F>(future: F) -> F::Output
where
    F: Future,
{
    LocalSet::new().run_until(future).await
}

/// Pending deadline owned by a single node.
///
/// Arming replaces any previous deadline; clearing aborts it. A guard that
/// already fired reports itself as disarmed.
#[derive(Debug, Default)]
pub struct Guard {
    handle: Option<AbortHandle>,
}

impl Guard {
    /// Create a disarmed guard
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Clear any pending deadline and arm a new one that runs `on_fire`
    /// after `after` has elapsed.
    pub fn arm<F>(&mut self, after: Duration, on_fire: F)
    where
        F: FnOnce() + 'static,
    {
        self.clear();
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(after).await;
            on_fire();
        });
        self.handle = Some(task.abort_handle());
    }

    /// Abort the pending deadline, if any
    pub fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a deadline is pending and has not fired yet
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_block_on() {
        let result = block_on(async { 42 }).unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_tick_is_fifo_and_deferred() {
        run_local(async {
            let log = Rc::new(RefCell::new(Vec::new()));
            for i in 0..3 {
                let log = Rc::clone(&log);
                next_tick(move || log.borrow_mut().push(i));
            }
            log.borrow_mut().push(99);

            tokio::time::sleep(Duration::from_millis(1)).await;
            assert_eq!(*log.borrow(), vec![99, 0, 1, 2]);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_fires_after_deadline() {
        run_local(async {
            let fired = Rc::new(RefCell::new(false));
            let mut guard = Guard::new();
            let flag = Rc::clone(&fired);
            guard.arm(Duration::from_millis(100), move || *flag.borrow_mut() = true);
            assert!(guard.is_armed());

            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(!*fired.borrow());

            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(*fired.borrow());
            assert!(!guard.is_armed());
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_clear_prevents_fire() {
        run_local(async {
            let fired = Rc::new(RefCell::new(false));
            let mut guard = Guard::new();
            let flag = Rc::clone(&fired);
            guard.arm(Duration::from_millis(100), move || *flag.borrow_mut() = true);
            guard.clear();
            assert!(!guard.is_armed());

            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(!*fired.borrow());
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        run_local(async {
            let fired = Rc::new(RefCell::new(0));
            let mut guard = Guard::new();

            let first = Rc::clone(&fired);
            guard.arm(Duration::from_millis(100), move || *first.borrow_mut() += 1);
            tokio::time::sleep(Duration::from_millis(60)).await;

            let second = Rc::clone(&fired);
            guard.arm(Duration::from_millis(100), move || *second.borrow_mut() += 10);
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert_eq!(*fired.borrow(), 0);

            tokio::time::sleep(Duration::from_millis(60)).await;
            assert_eq!(*fired.borrow(), 10);
        })
        .await;
    }
}
