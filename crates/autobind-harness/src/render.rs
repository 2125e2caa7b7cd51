//! Hook state for one node instance.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use autobind_core::deps::{DepList, are_deps_equal};
use autobind_core::host::{Component, Effect, EffectCleanup, RenderContext, Rerender, Scheduler};
use autobind_core::props::Props;

#[derive(Default)]
struct EffectSlot {
    deps: Option<DepList>,
    cleanup: Option<EffectCleanup>,
}

/// [`RenderContext`] of the harness host. Output nodes are strings.
///
/// Hooks are matched to their slots by call order, so a component must call
/// the same hooks in the same order on every render.
pub struct RenderCx {
    refs: Vec<Rc<dyn Any>>,
    effects: Vec<EffectSlot>,
    ref_cursor: usize,
    effect_cursor: usize,
    queued: Vec<(usize, DepList, Effect)>,
    dirty: Rc<Cell<bool>>,
    rerender_requests: Rc<Cell<usize>>,
    scheduler: Rc<dyn Scheduler>,
}

impl RenderCx {
    pub(crate) fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            refs: Vec::new(),
            effects: Vec::new(),
            ref_cursor: 0,
            effect_cursor: 0,
            queued: Vec::new(),
            dirty: Rc::new(Cell::new(false)),
            rerender_requests: Rc::new(Cell::new(0)),
            scheduler,
        }
    }

    /// Reset hook cursors and drop effects queued by an abandoned render.
    pub(crate) fn begin_render(&mut self) {
        self.ref_cursor = 0;
        self.effect_cursor = 0;
        self.queued.clear();
        self.dirty.set(false);
    }

    /// Run effects queued by the last render, each after the cleanup of its
    /// previous run. Every queued effect runs; the first error is returned.
    pub(crate) fn commit(&mut self) -> autobind_core::Result<()> {
        let mut first_error = None;
        for (index, deps, effect) in std::mem::take(&mut self.queued) {
            if index >= self.effects.len() {
                self.effects.resize_with(index + 1, EffectSlot::default);
            }
            let slot = &mut self.effects[index];
            if let Some(cleanup) = slot.cleanup.take() {
                if let Err(err) = cleanup() {
                    first_error.get_or_insert(err);
                }
            }
            slot.deps = Some(deps);
            match effect() {
                Ok(cleanup) => self.effects[index].cleanup = cleanup,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Run every stored effect cleanup, in call order.
    pub(crate) fn unmount(&mut self) -> autobind_core::Result<()> {
        self.queued.clear();
        let mut first_error = None;
        for slot in &mut self.effects {
            if let Some(cleanup) = slot.cleanup.take() {
                if let Err(err) = cleanup() {
                    first_error.get_or_insert(err);
                }
            }
            slot.deps = None;
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn rerender_requests(&self) -> usize {
        self.rerender_requests.get()
    }

    pub(crate) fn has_queued_effects(&self) -> bool {
        !self.queued.is_empty()
    }
}

impl RenderContext for RenderCx {
    type Node = String;

    fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let index = self.ref_cursor;
        self.ref_cursor += 1;
        if let Some(existing) = self.refs.get(index) {
            match Rc::clone(existing).downcast::<RefCell<T>>() {
                Ok(slot) => return slot,
                Err(_) => panic!("hook order changed between renders (ref slot {index})"),
            }
        }
        let slot = Rc::new(RefCell::new(init()));
        self.refs.push(Rc::clone(&slot) as Rc<dyn Any>);
        slot
    }

    fn use_effect(&mut self, deps: DepList, effect: Effect) {
        let index = self.effect_cursor;
        self.effect_cursor += 1;
        let previous = self.effects.get(index).and_then(|slot| slot.deps.as_ref());
        if !are_deps_equal(&deps, previous) {
            self.queued.push((index, deps, effect));
        }
    }

    fn use_force_update(&mut self) -> Rerender {
        let dirty = Rc::clone(&self.dirty);
        let requests = Rc::clone(&self.rerender_requests);
        Rerender::new(move || {
            dirty.set(true);
            requests.set(requests.get() + 1);
        })
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.scheduler)
    }
}

/// A component backed by a closure.
pub struct FnComponent<F>(F);

/// Wrap `render` as a [`Component`].
pub fn component<F>(render: F) -> FnComponent<F>
where
    F: Fn(&mut RenderCx, &Props) -> autobind_core::Result<String>,
{
    FnComponent(render)
}

impl<F> Component<RenderCx> for FnComponent<F>
where
    F: Fn(&mut RenderCx, &Props) -> autobind_core::Result<String>,
{
    fn render(&self, cx: &mut RenderCx, props: &Props) -> autobind_core::Result<String> {
        (self.0)(cx, props)
    }
}
