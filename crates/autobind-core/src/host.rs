#![forbid(unsafe_code)]

//! What a binding needs from the UI host.
//!
//! A host renders components through a [`RenderContext`]: per-instance
//! persistent slots, post-commit effects keyed by a dependency list, a way to
//! request a re-render, and a timer scheduler. Components implement
//! [`Component`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use web_time::Duration;

use crate::deps::DepList;
use crate::error::Result;
use crate::props::Props;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutId(pub u64);

/// Deferred task run by a [`Scheduler`].
pub type Task = Box<dyn FnOnce() -> Result<()>>;

pub trait Scheduler {
    /// Run `task` once, after `delay`.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimeoutId;

    /// Cancel a task that has not run yet. Unknown ids are ignored.
    fn clear_timeout(&self, id: TimeoutId);
}

/// Requests a re-render of one node instance.
#[derive(Clone)]
pub struct Rerender(Rc<dyn Fn()>);

impl Rerender {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Ask the host to render the node again. Never renders synchronously.
    pub fn request(&self) {
        (self.0)();
    }
}

impl fmt::Debug for Rerender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rerender")
    }
}

/// Runs when an effect is replaced or the node unmounts.
pub type EffectCleanup = Box<dyn FnOnce() -> Result<()>>;

/// Post-commit effect.
pub type Effect = Box<dyn FnOnce() -> Result<Option<EffectCleanup>>>;

pub trait RenderContext {
    /// Rendered output.
    type Node;

    /// Persistent slot for this call site, created by `init` on first render.
    fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>>;

    /// Run `effect` after commit when `deps` changed since the last commit.
    /// The cleanup of the previous run, if any, runs first.
    fn use_effect(&mut self, deps: DepList, effect: Effect);

    fn use_force_update(&mut self) -> Rerender;

    fn scheduler(&self) -> Rc<dyn Scheduler>;
}

pub trait Component<Cx: RenderContext> {
    fn render(&self, cx: &mut Cx, props: &Props) -> Result<Cx::Node>;

    /// Whether a parent-driven re-render with `next` can be skipped.
    fn props_unchanged(&self, _prev: &Props, _next: &Props) -> bool {
        false
    }
}
