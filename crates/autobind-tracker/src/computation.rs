#![forbid(unsafe_code)]

//! A single reactive computation.
//!
//! # Invariants
//!
//! 1. `first_run()` is true only during the synchronous run inside
//!    [`autorun`](crate::autorun).
//! 2. `invalidate()` queues the computation at most once until it re-runs.
//! 3. `stop()` is idempotent; on-stop callbacks fire exactly once.
//! 4. On-invalidate callbacks registered on an already invalidated
//!    computation run immediately, outside any computation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BoxError;
use crate::tracker;

pub(crate) type RunFn = Box<dyn FnMut(&Computation) -> Result<(), BoxError>>;
type Callback = Box<dyn FnOnce(&Computation)>;

static NEXT_COMPUTATION_ID: AtomicU64 = AtomicU64::new(1);

struct ComputationInner {
    id: u64,
    stopped: Cell<bool>,
    invalidated: Cell<bool>,
    first_run: Cell<bool>,
    recomputing: Cell<bool>,
    /// Taken out while the function runs.
    run: RefCell<Option<RunFn>>,
    on_invalidate: RefCell<Vec<Callback>>,
    on_stop: RefCell<Vec<Callback>>,
}

/// Handle to a reactive computation. Clones share the same computation.
#[derive(Clone)]
pub struct Computation {
    inner: Rc<ComputationInner>,
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.inner.id)
            .field("stopped", &self.inner.stopped.get())
            .field("invalidated", &self.inner.invalidated.get())
            .field("first_run", &self.inner.first_run.get())
            .finish()
    }
}

impl PartialEq for Computation {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Computation {}

impl Computation {
    pub(crate) fn new(run: RunFn) -> Self {
        Self {
            inner: Rc::new(ComputationInner {
                id: NEXT_COMPUTATION_ID.fetch_add(1, Ordering::Relaxed),
                stopped: Cell::new(false),
                invalidated: Cell::new(false),
                first_run: Cell::new(true),
                recomputing: Cell::new(false),
                run: RefCell::new(Some(run)),
                on_invalidate: RefCell::new(Vec::new()),
                on_stop: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Process-unique id, for logging and identity checks.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn first_run(&self) -> bool {
        self.inner.first_run.get()
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    #[inline]
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.inner.invalidated.get()
    }

    /// Register a callback for the next invalidation.
    pub fn on_invalidate(&self, f: impl FnOnce(&Computation) + 'static) {
        if self.inner.invalidated.get() {
            tracker::nonreactive(|| f(self));
        } else {
            self.inner.on_invalidate.borrow_mut().push(Box::new(f));
        }
    }

    /// Register a callback for when the computation stops.
    pub fn on_stop(&self, f: impl FnOnce(&Computation) + 'static) {
        if self.inner.stopped.get() {
            tracker::nonreactive(|| f(self));
        } else {
            self.inner.on_stop.borrow_mut().push(Box::new(f));
        }
    }

    /// Mark the computation for a re-run at the next flush.
    pub fn invalidate(&self) {
        if self.inner.invalidated.get() {
            return;
        }
        if !self.inner.recomputing.get() && !self.inner.stopped.get() {
            tracker::enqueue(self.clone());
        }
        self.inner.invalidated.set(true);

        let callbacks = std::mem::take(&mut *self.inner.on_invalidate.borrow_mut());
        tracker::nonreactive(|| {
            for callback in callbacks {
                callback(self);
            }
        });
    }

    /// Stop the computation. It will never run again.
    pub fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        tracing::debug!(computation_id = self.inner.id, "computation stopped");
        self.invalidate();

        let callbacks = std::mem::take(&mut *self.inner.on_stop.borrow_mut());
        tracker::nonreactive(|| {
            for callback in callbacks {
                callback(self);
            }
        });
    }

    pub(crate) fn finish_first_run(&self) {
        self.inner.first_run.set(false);
    }

    pub(crate) fn needs_recompute(&self) -> bool {
        self.inner.invalidated.get() && !self.inner.stopped.get()
    }

    pub(crate) fn compute(&self) -> Result<(), BoxError> {
        self.inner.invalidated.set(false);
        let Some(mut run) = self.inner.run.borrow_mut().take() else {
            return Ok(());
        };
        let outcome = tracker::with_current(self, || run(self));
        *self.inner.run.borrow_mut() = Some(run);
        outcome
    }

    pub(crate) fn recompute(&self) -> Result<(), BoxError> {
        if !self.needs_recompute() {
            return Ok(());
        }
        tracing::trace!(computation_id = self.inner.id, "computation re-run");
        self.inner.recomputing.set(true);
        let outcome = self.compute();
        self.inner.recomputing.set(false);
        outcome
    }
}
