#![forbid(unsafe_code)]

//! Thread-local tracker context, autorun creation and flushing.
//!
//! # Failure Modes
//!
//! - **Run function error during flush**: the flush keeps going. The first
//!   error is returned once the queue and all after-flush callbacks have
//!   drained; later errors are logged at `WARN`.
//! - **Run function error on first run**: the new computation is stopped and
//!   [`autorun`] returns the error.
//! - **Run function panics**: the current-computation slot is restored by a
//!   drop guard, so the tracker stays usable after the unwind.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::computation::{Computation, RunFn};
use crate::error::{BoxError, Result, TrackerError};

#[derive(Default)]
struct Context {
    current: Option<Computation>,
    in_compute: bool,
    in_flush: bool,
    pending: VecDeque<Computation>,
    after_flush: VecDeque<Box<dyn FnOnce()>>,
}

thread_local! {
    static CONTEXT: RefCell<Context> = RefCell::new(Context::default());
}

/// Restores the previous current computation when dropped.
struct CurrentGuard {
    previous: Option<Computation>,
    previous_in_compute: bool,
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let in_compute = self.previous_in_compute;
        CONTEXT.with(|cx| {
            let mut cx = cx.borrow_mut();
            cx.current = previous;
            cx.in_compute = in_compute;
        });
    }
}

fn swap_current(next: Option<Computation>, in_compute: bool) -> CurrentGuard {
    CONTEXT.with(|cx| {
        let mut cx = cx.borrow_mut();
        let previous = std::mem::replace(&mut cx.current, next);
        let previous_in_compute = std::mem::replace(&mut cx.in_compute, in_compute);
        CurrentGuard {
            previous,
            previous_in_compute,
        }
    })
}

pub(crate) fn with_current<R>(computation: &Computation, f: impl FnOnce() -> R) -> R {
    let _guard = swap_current(Some(computation.clone()), true);
    f()
}

pub(crate) fn enqueue(computation: Computation) {
    CONTEXT.with(|cx| cx.borrow_mut().pending.push_back(computation));
}

fn enqueue_front(computation: Computation) {
    CONTEXT.with(|cx| cx.borrow_mut().pending.push_front(computation));
}

fn next_pending() -> Option<Computation> {
    CONTEXT.with(|cx| cx.borrow_mut().pending.pop_front())
}

fn next_after_flush() -> Option<Box<dyn FnOnce()>> {
    CONTEXT.with(|cx| cx.borrow_mut().after_flush.pop_front())
}

/// The computation currently running, if any.
#[must_use]
pub fn current_computation() -> Option<Computation> {
    CONTEXT.with(|cx| cx.borrow().current.clone())
}

/// Whether reactive reads right now would be recorded.
#[must_use]
pub fn active() -> bool {
    CONTEXT.with(|cx| cx.borrow().current.is_some())
}

/// Number of invalidated computations waiting for the next flush.
#[must_use]
pub fn pending_count() -> usize {
    CONTEXT.with(|cx| cx.borrow().pending.len())
}

/// Run `f` with no current computation.
///
/// Reads inside `f` are not recorded, and autoruns created inside `f` are
/// not tied to the enclosing computation's lifetime.
pub fn nonreactive<R>(f: impl FnOnce() -> R) -> R {
    let in_compute = CONTEXT.with(|cx| cx.borrow().in_compute);
    let _guard = swap_current(None, in_compute);
    f()
}

/// Create a computation and run it once, synchronously.
///
/// When called while another computation is running, the new computation is
/// stopped as soon as the enclosing one is invalidated.
pub fn autorun(
    run: impl FnMut(&Computation) -> std::result::Result<(), BoxError> + 'static,
) -> Result<Computation> {
    autorun_boxed(Box::new(run))
}

pub(crate) fn autorun_boxed(run: RunFn) -> Result<Computation> {
    let computation = Computation::new(run);

    if let Some(parent) = current_computation() {
        let child = computation.clone();
        parent.on_invalidate(move |_| child.stop());
    }

    tracing::debug!(computation_id = computation.id(), "autorun created");

    let outcome = computation.compute();
    computation.finish_first_run();
    match outcome {
        Ok(()) => Ok(computation),
        Err(source) => {
            computation.stop();
            Err(TrackerError::Run {
                computation_id: computation.id(),
                source,
            })
        }
    }
}

/// Schedule `f` to run at the end of the next flush.
pub fn after_flush(f: impl FnOnce() + 'static) {
    CONTEXT.with(|cx| cx.borrow_mut().after_flush.push_back(Box::new(f)));
}

/// Reset the in-flush flag even when a run function panics.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        CONTEXT.with(|cx| cx.borrow_mut().in_flush = false);
    }
}

/// Re-run every invalidated computation, then the after-flush callbacks.
///
/// After each after-flush callback the queue is drained again, so
/// callbacks that invalidate computations see them re-run in the same flush.
pub fn flush() -> Result<()> {
    CONTEXT.with(|cx| {
        let mut cx = cx.borrow_mut();
        if cx.in_flush {
            return Err(TrackerError::ReentrantFlush);
        }
        if cx.in_compute {
            return Err(TrackerError::FlushInCompute);
        }
        cx.in_flush = true;
        Ok(())
    })?;
    let _guard = FlushGuard;

    let mut first_error: Option<TrackerError> = None;
    let mut reruns = 0usize;
    loop {
        while let Some(computation) = next_pending() {
            reruns += 1;
            if let Err(source) = computation.recompute() {
                let computation_id = computation.id();
                if first_error.is_none() {
                    first_error = Some(TrackerError::Run {
                        computation_id,
                        source,
                    });
                } else {
                    tracing::warn!(computation_id, error = %source, "computation failed during flush");
                }
            }
            if computation.needs_recompute() {
                enqueue_front(computation);
            }
        }

        match next_after_flush() {
            Some(callback) => callback(),
            None => break,
        }
    }

    tracing::trace!(reruns, "flush complete");
    first_error.map_or(Ok(()), Err)
}

/// Handle to the thread's tracker, for code that takes the engine as a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tracker;

impl Tracker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn autorun(
        &self,
        run: impl FnMut(&Computation) -> std::result::Result<(), BoxError> + 'static,
    ) -> Result<Computation> {
        autorun(run)
    }

    pub fn nonreactive<R>(&self, f: impl FnOnce() -> R) -> R {
        nonreactive(f)
    }

    pub fn flush(&self) -> Result<()> {
        flush()
    }

    pub fn after_flush(&self, f: impl FnOnce() + 'static) {
        after_flush(f);
    }

    #[must_use]
    pub fn current_computation(&self) -> Option<Computation> {
        current_computation()
    }

    #[must_use]
    pub fn active(&self) -> bool {
        active()
    }
}
