//! Parent capability set and the stock collaborators
//!
//! Every node notifies its parent through [`Parent`]. A node's parent is
//! either another node or, above the root, a collaborator:
//! - [`Detached`] ignores everything (the sentinel above a bare root)
//! - [`Callbacks`] forwards to closures, one per notification
//! - [`Recorder`] keeps an ordered log of what reached it
//!
//! The run controller in `tally-harness` is another collaborator; it owns
//! the run-wide totals and decides what a failure means for the process.

use crate::failure::Failure;
use crate::node::Test;
use std::cell::RefCell;
use std::fmt;

/// Notifications a node sends upward.
///
/// All methods default to no-ops so a collaborator only implements what it
/// cares about. `origin` is always the node where the event started, not
/// the immediate child that forwarded it.
pub trait Parent {
    /// A node somewhere below planned `count` more assertions
    fn planned(&self, _origin: &Test, _count: usize) {}

    /// An assertion somewhere below passed
    fn passed(&self, _origin: &Test, _message: &str) {}

    /// An assertion or the protocol failed somewhere below
    fn failed(&self, _origin: &Test, _failure: &Failure) {}

    /// A child has nothing outstanding; check whether this parent can proceed
    fn serve(&self) {}

    /// The node behind this parent, if it is one
    fn as_test(&self) -> Option<&Test> {
        None
    }
}

/// Sentinel parent with no further ancestor
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Parent for Detached {}

type PlannedHook = Box<dyn Fn(&Test, usize)>;
type PassedHook = Box<dyn Fn(&Test, &str)>;
type FailedHook = Box<dyn Fn(&Test, &Failure)>;
type ServeHook = Box<dyn Fn()>;

/// Collaborator built from closures.
///
/// Useful for wiring a nested root into an enclosing test, e.g. relaying
/// every inner pass to the outer node:
///
/// ```ignore
/// let relay = Callbacks::new().on_passed(move |_, message| outer.pass(message));
/// let inner = Test::root(Rc::new(relay));
/// ```
#[derive(Default)]
pub struct Callbacks {
    planned: Option<PlannedHook>,
    passed: Option<PassedHook>,
    failed: Option<FailedHook>,
    serve: Option<ServeHook>,
}

impl Callbacks {
    /// Create a collaborator with no hooks installed
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_planned(mut self, hook: impl Fn(&Test, usize) + 'static) -> Self {
        self.planned = Some(Box::new(hook));
        self
    }

    pub fn on_passed(mut self, hook: impl Fn(&Test, &str) + 'static) -> Self {
        self.passed = Some(Box::new(hook));
        self
    }

    pub fn on_failed(mut self, hook: impl Fn(&Test, &Failure) + 'static) -> Self {
        self.failed = Some(Box::new(hook));
        self
    }

    pub fn on_serve(mut self, hook: impl Fn() + 'static) -> Self {
        self.serve = Some(Box::new(hook));
        self
    }
}

impl Parent for Callbacks {
    fn planned(&self, origin: &Test, count: usize) {
        if let Some(hook) = &self.planned {
            hook(origin, count);
        }
    }

    fn passed(&self, origin: &Test, message: &str) {
        if let Some(hook) = &self.passed {
            hook(origin, message);
        }
    }

    fn failed(&self, origin: &Test, failure: &Failure) {
        if let Some(hook) = &self.failed {
            hook(origin, failure);
        }
    }

    fn serve(&self) {
        if let Some(hook) = &self.serve {
            hook();
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("planned", &self.planned.is_some())
            .field("passed", &self.passed.is_some())
            .field("failed", &self.failed.is_some())
            .field("serve", &self.serve.is_some())
            .finish()
    }
}

/// A notification as seen by a [`Recorder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Planned { node: u64, count: usize },
    Passed { node: u64, message: String },
    Failed { node: u64, failure: Failure },
    Serve,
}

/// Collaborator that logs every notification in arrival order
#[derive(Debug, Default)]
pub struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Sum of all plan counts that reached this collaborator
    pub fn planned_total(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .map(|event| match event {
                Event::Planned { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// `(origin id, message)` for every pass, in order
    pub fn passes(&self) -> Vec<(u64, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Passed { node, message } => Some((*node, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// `(origin id, failure)` for every failure, in order
    pub fn failures(&self) -> Vec<(u64, Failure)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Failed { node, failure } => Some((*node, failure.clone())),
                _ => None,
            })
            .collect()
    }

    /// How many times `serve` reached this collaborator
    pub fn serves(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::Serve))
            .count()
    }
}

impl Parent for Recorder {
    fn planned(&self, origin: &Test, count: usize) {
        self.events.borrow_mut().push(Event::Planned {
            node: origin.id(),
            count,
        });
    }

    fn passed(&self, origin: &Test, message: &str) {
        self.events.borrow_mut().push(Event::Passed {
            node: origin.id(),
            message: message.to_string(),
        });
    }

    fn failed(&self, origin: &Test, failure: &Failure) {
        self.events.borrow_mut().push(Event::Failed {
            node: origin.id(),
            failure: failure.clone(),
        });
    }

    fn serve(&self) {
        self.events.borrow_mut().push(Event::Serve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::run_local;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_receive_notifications() {
        run_local(async {
            let planned = Rc::new(Cell::new(0));
            let messages = Rc::new(RefCell::new(Vec::new()));

            let callbacks = {
                let planned = Rc::clone(&planned);
                let messages = Rc::clone(&messages);
                Callbacks::new()
                    .on_planned(move |_, count| planned.set(planned.get() + count))
                    .on_passed(move |_, message| messages.borrow_mut().push(message.to_string()))
            };
            let root = Test::root(Rc::new(callbacks));
            root.plan(2);
            root.ok(true, "first");
            root.pass("");

            assert_eq!(planned.get(), 2);
            assert_eq!(*messages.borrow(), vec!["first", "passed"]);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_root_is_silent() {
        run_local(async {
            let root = Test::root(Rc::new(Detached));
            root.plan(1);
            root.ok(true, "");
            assert_eq!(root.counts().passed, 1);
            assert!(root.parent().is_none());
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorder_log_order() {
        run_local(async {
            let recorder = Rc::new(Recorder::new());
            let root = Test::root(recorder.clone());
            root.plan(1);
            root.fail("nope");

            assert_eq!(
                recorder.events(),
                vec![
                    Event::Planned {
                        node: root.id(),
                        count: 1
                    },
                    Event::Failed {
                        node: root.id(),
                        failure: Failure::assertion("nope")
                    },
                ]
            );
            assert_eq!(recorder.planned_total(), 1);
            assert_eq!(recorder.serves(), 0);
        })
        .await;
    }
}
