//! Test nodes and the plan/pass/fail propagation protocol
//!
//! A [`Test`] is a handle to one node of the test tree. Nodes count their own
//! assertions (`planned`, `passed`, `done`) and the assertions of everything
//! below them (`planned_descendants`, `passed_descendants`).
//!
//! # Ordering
//!
//! Declaring a child never runs it synchronously. The child is queued on its
//! parent and a `serve` poke is scheduled for the next tick. `serve` only
//! dequeues the next child once every planned descendant assertion has
//! passed, so a child with outstanding asynchronous assertions holds back
//! its later siblings.
//!
//! # Re-entrancy
//!
//! `pass` calls `serve`, which may start a child body, which may call `pass`
//! again. No interior borrow is held across a call into a body or a parent.

use crate::collaborator::Parent;
use crate::failure::Failure;
use crate::tick::{self, Guard};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Deadline armed by `plan` when nothing else is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Global node ID counter
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Callable supplied by the test author, run once when the node starts
pub type Body = Box<dyn FnOnce(Test)>;

/// Read-only snapshot of a node's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    /// Assertions this node declared it will make
    pub planned: usize,
    /// Own assertions that passed
    pub passed: usize,
    /// Own assertions that resolved either way
    pub done: usize,
    /// Plans declared anywhere below this node
    pub planned_descendants: usize,
    /// Assertions passed anywhere below this node
    pub passed_descendants: usize,
}

impl Counts {
    /// Every planned own assertion resolved (pass or fail)
    pub fn is_done(&self) -> bool {
        self.done == self.planned
    }

    /// No descendant assertion is outstanding
    pub fn descendants_settled(&self) -> bool {
        self.planned_descendants == self.passed_descendants
    }

    /// Own and descendant assertions all passed
    pub fn is_resolved(&self) -> bool {
        self.descendants_settled() && self.planned == self.passed
    }
}

struct Node {
    id: u64,
    parent: Rc<dyn Parent>,
    depth: i32,
    description: Option<String>,
    body: RefCell<Option<Body>>,
    queue: RefCell<VecDeque<Test>>,
    introduced: Cell<bool>,
    timeout: Cell<Duration>,
    guard: RefCell<Guard>,

    planned: Cell<usize>,
    passed: Cell<usize>,
    done: Cell<usize>,
    planned_descendants: Cell<usize>,
    passed_descendants: Cell<usize>,
}

/// Handle to a node in the test tree.
///
/// Cloning is cheap and yields another handle to the same node.
#[derive(Clone)]
pub struct Test(Rc<Node>);

impl Test {
    /// Create a root node (depth -1) reporting to `parent`.
    pub fn root(parent: Rc<dyn Parent>) -> Self {
        Self::create(parent, -1, None, None, DEFAULT_TIMEOUT)
    }

    fn create(
        parent: Rc<dyn Parent>,
        depth: i32,
        description: Option<String>,
        body: Option<Body>,
        timeout: Duration,
    ) -> Self {
        let id = NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Test(Rc::new(Node {
            id,
            parent,
            depth,
            description,
            body: RefCell::new(body),
            queue: RefCell::new(VecDeque::new()),
            introduced: Cell::new(false),
            timeout: Cell::new(timeout),
            guard: RefCell::new(Guard::new()),
            planned: Cell::new(0),
            passed: Cell::new(0),
            done: Cell::new(0),
            planned_descendants: Cell::new(0),
            passed_descendants: Cell::new(0),
        }))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Process-unique identifier
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Tree depth; the root is -1
    pub fn depth(&self) -> i32 {
        self.0.depth
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// Snapshot of all counters
    pub fn counts(&self) -> Counts {
        Counts {
            planned: self.0.planned.get(),
            passed: self.0.passed.get(),
            done: self.0.done.get(),
            planned_descendants: self.0.planned_descendants.get(),
            passed_descendants: self.0.passed_descendants.get(),
        }
    }

    /// Enclosing node, if the parent is a node rather than a collaborator
    pub fn parent(&self) -> Option<Test> {
        self.0.parent.as_test().cloned()
    }

    /// Children declared but not started yet
    pub fn queued(&self) -> usize {
        self.0.queue.borrow().len()
    }

    /// Deadline armed by the next `plan` call
    pub fn timeout(&self) -> Duration {
        self.0.timeout.get()
    }

    /// Change the deadline used by subsequent `plan` calls.
    ///
    /// Children declared afterwards inherit it.
    pub fn set_timeout(&self, timeout: Duration) {
        self.0.timeout.set(timeout);
    }

    /// Whether a timeout guard is pending for this node
    pub fn has_pending_timeout(&self) -> bool {
        self.0.guard.borrow().is_armed()
    }

    pub fn is_introduced(&self) -> bool {
        self.0.introduced.get()
    }

    /// Mark this node and every ancestor not yet introduced as introduced.
    ///
    /// Returns the newly introduced nodes outermost first, so output can
    /// print each description header once, in tree order.
    pub fn introduce(&self) -> Vec<Test> {
        let mut chain = Vec::new();
        let mut cursor = Some(self.clone());
        while let Some(test) = cursor {
            if test.is_introduced() {
                break;
            }
            cursor = test.parent();
            chain.push(test);
        }
        chain.reverse();
        for test in &chain {
            test.0.introduced.set(true);
        }
        chain
    }

    // ========================================================================
    // Factory
    // ========================================================================

    /// Declare a child test.
    ///
    /// The child is queued behind any earlier siblings and its body runs on a
    /// later tick, after the declaring scope returns and once every earlier
    /// sibling's planned assertions have passed.
    pub fn test<F>(&self, description: impl Into<String>, body: F)
    where
        F: FnOnce(Test) + 'static,
    {
        let parent: Rc<dyn Parent> = Rc::new(self.clone());
        let child = Test::create(
            parent,
            self.0.depth + 1,
            Some(description.into()),
            Some(Box::new(body)),
            self.0.timeout.get(),
        );
        trace!(parent = self.id(), child = child.id(), "queued child");
        self.0.queue.borrow_mut().push_back(child.clone());

        tick::next_tick(move || child.serve());
    }

    /// Run the body. Only the first call has any effect.
    ///
    /// A panicking body is reported as a [`Failure::Panicked`] on this node.
    pub fn start(&self) {
        let body = self.0.body.borrow_mut().take();
        let Some(body) = body else {
            return;
        };
        debug!(
            node = self.id(),
            description = self.description().unwrap_or_default(),
            "starting test"
        );
        self.run(body);
    }

    /// Run `body` against this node now.
    ///
    /// A panic inside `body` is caught and reported as a
    /// [`Failure::Panicked`] on this node.
    pub fn run<F>(&self, body: F)
    where
        F: FnOnce(Test),
    {
        let this = self.clone();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || body(this))) {
            let message = panic_message(payload.as_ref());
            warn!(node = self.id(), %message, "test body panicked");
            self.report_failure(Failure::Panicked(message));
        }
    }

    // ========================================================================
    // Plan / pass / fail
    // ========================================================================

    /// Declare `count` more assertions for this node and re-arm its timeout.
    ///
    /// Every ancestor learns about the plan. Each call pushes the deadline
    /// out to `timeout()` from now.
    pub fn plan(&self, count: usize) {
        let node = &self.0;
        node.planned.set(node.planned.get() + count);
        trace!(node = node.id, count, planned = node.planned.get(), "plan");
        if count > 0 {
            node.parent.planned(self, count);
        }

        let after = node.timeout.get();
        let this = self.clone();
        node.guard.borrow_mut().arm(after, move || this.expire());
        debug!(node = node.id, timeout_ms = after.as_millis() as u64, "armed timeout");
    }

    /// Resolve one planned assertion successfully.
    ///
    /// An empty message is reported as "passed".
    pub fn pass(&self, message: &str) {
        let node = &self.0;
        node.passed.set(node.passed.get() + 1);
        node.done.set(node.done.get() + 1);
        trace!(node = node.id, message, "pass");
        node.parent.passed(self, or_default(message, "passed"));

        if node.planned.get() == 0 {
            warn!(node = node.id, "assertion without a plan");
            self.report_failure(Failure::AlwaysPlan);
        } else if node.done.get() > node.planned.get() {
            warn!(node = node.id, planned = node.planned.get(), "too many assertions");
            self.report_failure(Failure::TooManyTimes);
        }

        if node.done.get() == node.planned.get() {
            self.clear_timeout();
        }

        self.serve();
    }

    /// Resolve one planned assertion as failed.
    ///
    /// An empty message is reported as "failed". Failing never advances the
    /// queue.
    pub fn fail(&self, message: &str) {
        self.report_failure(Failure::assertion(or_default(message, "failed")));
    }

    /// Resolve one planned assertion with an explicit failure reason
    pub fn report_failure(&self, failure: Failure) {
        let node = &self.0;
        node.done.set(node.done.get() + 1);
        trace!(node = node.id, %failure, "fail");
        node.parent.failed(self, &failure);

        if node.done.get() == node.planned.get() {
            self.clear_timeout();
        }
    }

    fn expire(&self) {
        let counts = self.counts();
        if counts.done != counts.planned {
            warn!(
                node = self.id(),
                done = counts.done,
                planned = counts.planned,
                "test timed out"
            );
            self.report_failure(Failure::Timeout);
        }
    }

    fn clear_timeout(&self) {
        self.0.guard.borrow_mut().clear();
    }

    // ========================================================================
    // Drain loop
    // ========================================================================

    /// Make progress if nothing below this node is outstanding.
    ///
    /// Starts the next queued child, or, when the queue is empty and every
    /// own assertion passed, asks the parent to do the same.
    pub fn serve(&self) {
        let node = &self.0;
        if node.planned_descendants.get() != node.passed_descendants.get() {
            trace!(
                node = node.id,
                planned = node.planned_descendants.get(),
                passed = node.passed_descendants.get(),
                "waiting on descendants"
            );
            return;
        }

        let next = node.queue.borrow_mut().pop_front();
        match next {
            Some(child) => child.start(),
            None if node.planned.get() == node.passed.get() => node.parent.serve(),
            None => {}
        }
    }
}

impl Parent for Test {
    fn planned(&self, origin: &Test, count: usize) {
        let node = &self.0;
        node.planned_descendants
            .set(node.planned_descendants.get() + count);
        node.parent.planned(origin, count);
    }

    fn passed(&self, origin: &Test, message: &str) {
        let node = &self.0;
        node.passed_descendants
            .set(node.passed_descendants.get() + 1);
        node.parent.passed(origin, message);
        Test::serve(self);
    }

    fn failed(&self, origin: &Test, failure: &Failure) {
        self.0.parent.failed(origin, failure);
    }

    fn serve(&self) {
        Test::serve(self);
    }

    fn as_test(&self) -> Option<&Test> {
        Some(self)
    }
}

impl PartialEq for Test {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Test {}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("id", &self.id())
            .field("description", &self.description())
            .field("depth", &self.depth())
            .field("counts", &self.counts())
            .field("queued", &self.queued())
            .finish()
    }
}

/// `message`, or `default` when it is empty
pub(crate) fn or_default<'a>(message: &'a str, default: &'a str) -> &'a str {
    if message.is_empty() {
        default
    } else {
        message
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
