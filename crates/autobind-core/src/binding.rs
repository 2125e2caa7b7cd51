#![forbid(unsafe_code)]

//! Tracked-value binding.
//!
//! [`use_controlled_tracker`] gives one node instance one reactive
//! computation. The computation's first run happens inside the render that
//! creates it, so the value is available immediately. Later runs happen
//! off-render when the engine flushes; they update the stored value and
//! request a re-render when it changed.
//!
//! # Lifecycle
//!
//! ```text
//! render ──deps changed──▶ dispose old ─▶ create (nonreactive) ─▶ first run
//!    │                                                            │
//!    └──deps equal──▶ reuse value                 not committed ──▶ arm mount guard
//!
//! commit ─▶ mounted, guard cancelled, deferred change replayed
//! unmount ─▶ dispose
//! ```
//!
//! # Invariants
//!
//! 1. At most one live computation per binding. The previous one is disposed
//!    (cleanup, then stop) before its replacement is created.
//! 2. No `RefCell` borrow of the binding state is held while user code runs.
//! 3. A run that happens before commit never requests a re-render; the
//!    change is replayed at commit.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::deps::{DepList, are_deps_equal};
use crate::diagnostics;
use crate::engine::{Computation, ReactiveEngine, RunFn};
use crate::error::{BindingError, BoxError, Result};
use crate::handle::{Control, Status, TrackerHandle};
use crate::host::{EffectCleanup, RenderContext, Rerender, Scheduler, TimeoutId};
use crate::options::{Cleanup, Resolved, TrackerOptions};

type ReactiveFn<T> = Rc<dyn Fn(&TrackerHandle) -> T>;

/// Per-instance binding state, kept in a host ref slot.
struct Slot<T, E: ReactiveEngine> {
    engine: E,
    status: Status,
    computation: Option<E::Computation>,
    /// `None` after `resume`: the next comparison always reports a change.
    previous_deps: Option<DepList>,
    /// Dependency list passed on the latest render.
    render_deps: DepList,
    data: Option<T>,
    cleanup: Option<Cleanup>,
    reactive_fn: Option<ReactiveFn<T>>,
    options: Option<Resolved<T>>,
    mounted: bool,
    pending_change: bool,
    guard: Option<TimeoutId>,
    rerender: Option<Rerender>,
    scheduler: Option<Rc<dyn Scheduler>>,
}

type Shared<T, E> = RefCell<Slot<T, E>>;

impl<T, E: ReactiveEngine> Slot<T, E> {
    fn new(engine: E) -> Self {
        Self {
            engine,
            status: Status::Running,
            computation: None,
            previous_deps: None,
            render_deps: DepList::default(),
            data: None,
            cleanup: None,
            reactive_fn: None,
            options: None,
            mounted: false,
            pending_change: false,
            guard: None,
            rerender: None,
            scheduler: None,
        }
    }
}

/// Bind the value of `reactive_fn` to the calling node instance.
///
/// `reactive_fn` runs inside a computation owned by this call site and is
/// re-run whenever the reactive data it read changes. The closure passed on
/// the latest render is the one later re-runs use.
///
/// The computation is recreated whenever `deps` differs from the list given
/// on the previous render. [`DepList::Unconditional`] recreates it on every
/// render and disposes it after its first invalidation.
///
/// # Errors
///
/// Fails when recreating the computation runs a cleanup that fails, or when
/// the engine rejects the new computation.
pub fn use_controlled_tracker<Cx, E, T>(
    cx: &mut Cx,
    engine: &E,
    reactive_fn: impl Fn(&TrackerHandle) -> T + 'static,
    deps: impl Into<DepList>,
    options: TrackerOptions<T>,
) -> Result<(T, TrackerHandle)>
where
    Cx: RenderContext,
    E: ReactiveEngine,
    T: Clone + PartialEq + 'static,
{
    let deps = deps.into();
    if let Some(kind) = deps.invalid_kind() {
        diagnostics::invalid_deps(kind);
    }

    let slot = cx.use_ref(|| Slot::<T, E>::new(engine.clone()));
    let rerender = cx.use_force_update();
    let scheduler = cx.scheduler();
    {
        let mut state = slot.borrow_mut();
        state.reactive_fn = Some(Rc::new(reactive_fn));
        state.options = Some(options.resolve());
        state.rerender = Some(rerender);
        state.scheduler = Some(scheduler);
        state.render_deps = deps.clone();
    }

    let needs_new = {
        let state = slot.borrow();
        state.status >= Status::Paused && !are_deps_equal(&deps, state.previous_deps.as_ref())
    };
    if needs_new {
        recreate(&slot, deps)?;
    }

    let committed = Rc::clone(&slot);
    cx.use_effect(DepList::empty(), Box::new(move || on_commit(&committed)));

    let value = slot.borrow().data.clone().ok_or(BindingError::NoValue)?;
    Ok((value, TrackerHandle::attached(&slot)))
}

/// [`use_controlled_tracker`] with default options, returning only the value.
///
/// # Errors
///
/// As [`use_controlled_tracker`].
pub fn use_tracker<Cx, E, T>(
    cx: &mut Cx,
    engine: &E,
    reactive_fn: impl Fn() -> T + 'static,
    deps: impl Into<DepList>,
) -> Result<T>
where
    Cx: RenderContext,
    E: ReactiveEngine,
    T: Clone + PartialEq + 'static,
{
    use_controlled_tracker(cx, engine, move |_| reactive_fn(), deps, TrackerOptions::new())
        .map(|(value, _)| value)
}

/// Run the creation cleanup, stop the computation and cancel the mount guard.
fn dispose<T, E: ReactiveEngine>(slot: &Shared<T, E>) -> Result<()> {
    let (cleanup, computation, guard, scheduler) = {
        let mut state = slot.borrow_mut();
        (
            state.cleanup.take(),
            state.computation.take(),
            state.guard.take(),
            state.scheduler.clone(),
        )
    };

    let outcome = cleanup
        .map_or(Ok(()), Cleanup::run)
        .map_err(BindingError::Cleanup);
    if let Some(computation) = computation {
        tracing::debug!(computation_id = computation.id(), "computation disposed");
        computation.stop();
    }
    if let (Some(id), Some(scheduler)) = (guard, scheduler) {
        scheduler.clear_timeout(id);
    }
    outcome
}

fn recreate<T, E>(slot: &Rc<Shared<T, E>>, deps: DepList) -> Result<()>
where
    E: ReactiveEngine,
    T: Clone + PartialEq + 'static,
{
    dispose(slot)?;

    let deps_len = deps.as_slice().map(<[_]>::len);
    let engine = {
        let mut state = slot.borrow_mut();
        state.previous_deps = Some(deps);
        state.engine.clone()
    };

    let weak = Rc::downgrade(slot);
    let run: RunFn<E::Computation> = Box::new(move |c: &E::Computation| run_computation(&weak, c));
    let computation = engine
        .nonreactive(|| engine.autorun(run))
        .map_err(BindingError::from_engine)?;

    let (keep, mounted, delay, scheduler) = {
        let mut state = slot.borrow_mut();
        let keep = state.status == Status::Running;
        if keep {
            state.computation = Some(computation.clone());
        }
        let delay = state.options.as_ref().map(|o| o.mount_guard);
        (keep, state.mounted, delay, state.scheduler.clone())
    };

    if !keep {
        // The first run stopped or paused the handle.
        tracing::debug!(
            computation_id = computation.id(),
            "handle left running state during first run; stopping"
        );
        slot.borrow_mut().computation = Some(computation);
        return dispose(slot);
    }
    tracing::debug!(computation_id = computation.id(), ?deps_len, "computation created");

    if !mounted {
        if let (Some(delay), Some(scheduler)) = (delay, scheduler) {
            let weak = Rc::downgrade(slot);
            let id = scheduler.set_timeout(delay, Box::new(move || mount_guard_fired(&weak)));
            slot.borrow_mut().guard = Some(id);
        }
    }
    Ok(())
}

fn mount_guard_fired<T, E: ReactiveEngine>(weak: &Weak<Shared<T, E>>) -> Result<()> {
    let Some(slot) = weak.upgrade() else {
        return Ok(());
    };
    let expired = {
        let mut state = slot.borrow_mut();
        state.guard = None;
        !state.mounted
    };
    if expired {
        tracing::debug!("node never committed; mount guard disposing computation");
        dispose(&slot)
    } else {
        Ok(())
    }
}

fn run_computation<T, E>(weak: &Weak<Shared<T, E>>, computation: &E::Computation) -> std::result::Result<(), BoxError>
where
    E: ReactiveEngine,
    T: Clone + PartialEq + 'static,
{
    let Some(slot) = weak.upgrade() else {
        return Ok(());
    };
    let handle = TrackerHandle::attached(&slot);

    if computation.first_run() {
        let (on_created, reactive_fn, options) = {
            let mut state = slot.borrow_mut();
            state.status = Status::Running;
            (
                state.options.as_ref().and_then(|o| o.on_computation_created.clone()),
                state.reactive_fn.clone(),
                state.options.clone(),
            )
        };
        if let Some(on_created) = on_created {
            let cleanup = on_created(computation);
            slot.borrow_mut().cleanup = cleanup;
        }
        let (Some(reactive_fn), Some(options)) = (reactive_fn, options) else {
            return Ok(());
        };
        let next = reactive_fn(&handle);
        let previous = slot.borrow().data.clone();
        let next = options.apply_transform(previous.as_ref(), next);
        diagnostics::check_cursor(&next);
        slot.borrow_mut().data = Some(next);
        return Ok(());
    }

    let (tracked, mounted) = {
        let state = slot.borrow();
        (
            state.previous_deps.as_ref().is_some_and(DepList::is_list),
            state.mounted,
        )
    };

    if !mounted {
        // Replayed by the commit effect.
        tracing::trace!(computation_id = computation.id(), "change before commit deferred");
        slot.borrow_mut().pending_change = true;
        return Ok(());
    }

    if !tracked {
        tracing::trace!(computation_id = computation.id(), "untracked binding invalidated");
        dispose(&slot).map_err(|err| Box::new(err) as BoxError)?;
        request_rerender(&slot);
        return Ok(());
    }

    let (reactive_fn, options, previous) = {
        let state = slot.borrow();
        (
            state.reactive_fn.clone(),
            state.options.clone(),
            state.data.clone(),
        )
    };
    let (Some(reactive_fn), Some(options)) = (reactive_fn, options) else {
        return Ok(());
    };
    let next = reactive_fn(&handle);
    let next = options.apply_transform(previous.as_ref(), next);
    diagnostics::check_cursor(&next);
    let changed = previous.as_ref().is_none_or(|prev| !(options.is_equal)(prev, &next));
    tracing::trace!(computation_id = computation.id(), changed, "computation re-ran");
    if changed {
        slot.borrow_mut().data = Some(next);
        request_rerender(&slot);
    }
    Ok(())
}

fn request_rerender<T, E: ReactiveEngine>(slot: &Shared<T, E>) {
    let rerender = slot.borrow().rerender.clone();
    if let Some(rerender) = rerender {
        rerender.request();
    }
}

fn on_commit<T, E>(slot: &Rc<Shared<T, E>>) -> Result<Option<EffectCleanup>>
where
    E: ReactiveEngine,
    T: Clone + PartialEq + 'static,
{
    let (guard, scheduler, replay) = {
        let mut state = slot.borrow_mut();
        state.mounted = true;
        let pending = std::mem::take(&mut state.pending_change);
        let lost = state.computation.is_none();
        let replay = state.status == Status::Running && (pending || lost);
        (state.guard.take(), state.scheduler.clone(), replay)
    };
    if let (Some(id), Some(scheduler)) = (guard, scheduler) {
        scheduler.clear_timeout(id);
    }

    if replay {
        let (previous, deps) = {
            let state = slot.borrow();
            (state.data.clone(), state.render_deps.clone())
        };
        tracing::debug!("replaying change that arrived before commit");
        recreate(slot, deps)?;
        let changed = {
            let state = slot.borrow();
            match (&previous, &state.data, &state.options) {
                (Some(prev), Some(next), Some(options)) => !(options.is_equal)(prev, next),
                _ => true,
            }
        };
        if changed {
            request_rerender(slot);
        }
    }

    let slot = Rc::clone(slot);
    Ok(Some(Box::new(move || {
        slot.borrow_mut().mounted = false;
        dispose(&slot)
    })))
}

impl<T, E: ReactiveEngine> Control for Shared<T, E> {
    fn status(&self) -> Status {
        self.borrow().status
    }

    fn stop(&self) -> Result<()> {
        // Every status satisfies this; kept as the entry contract.
        if self.borrow().status.code() > 1 {
            return Ok(());
        }
        {
            let mut state = self.borrow_mut();
            state.status = Status::Stopped;
            state.pending_change = false;
        }
        tracing::debug!("binding stopped");
        dispose(self)
    }

    fn pause(&self) -> Result<()> {
        if self.borrow().status.code() > 1 {
            return Ok(());
        }
        {
            let mut state = self.borrow_mut();
            state.status = Status::Paused;
            state.pending_change = false;
        }
        tracing::debug!("binding paused");
        dispose(self)
    }

    fn resume(&self) -> Result<()> {
        if self.borrow().status.code() > 1 {
            return Ok(());
        }
        {
            let mut state = self.borrow_mut();
            state.status = Status::Running;
            state.previous_deps = None;
        }
        tracing::debug!("binding resumed");
        let outcome = dispose(self);
        request_rerender(self);
        outcome
    }

    fn computation_id(&self) -> Option<u64> {
        self.borrow().computation.as_ref().map(Computation::id)
    }
}
