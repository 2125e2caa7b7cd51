//! A mounted node instance and the host driving it.

use std::rc::Rc;

use autobind_core::host::{Component, Scheduler};
use autobind_core::props::Props;
use web_time::Duration;

use crate::clock::{LabClock, LabScheduler};
use crate::error::Result;
use crate::render::RenderCx;

/// Upper bound on back-to-back self-driven renders in one [`Root::settle`].
const MAX_SETTLE_RENDERS: usize = 64;

/// Owns the lab clock and timer queue shared by every root it creates.
pub struct Harness {
    scheduler: Rc<LabScheduler>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheduler: Rc::new(LabScheduler::new(LabClock::new())),
        }
    }

    #[must_use]
    pub fn clock(&self) -> &LabClock {
        self.scheduler.clock()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Rc<LabScheduler> {
        &self.scheduler
    }

    /// Create an unrendered root for `component`.
    pub fn root<C: Component<RenderCx>>(&self, component: C, props: Props) -> Root<C> {
        let scheduler: Rc<dyn Scheduler> = self.scheduler.clone();
        Root {
            component,
            props,
            committed_props: None,
            cx: RenderCx::new(scheduler),
            output: None,
            renders: 0,
            mounted: false,
        }
    }

    /// Re-run invalidated computations of the bundled tracker.
    pub fn flush(&self) -> Result<()> {
        autobind_tracker::flush()?;
        Ok(())
    }

    /// Advance the lab clock, running timers that come due.
    pub fn advance(&self, delta: Duration) -> Result<usize> {
        Ok(self.scheduler.advance(delta)?)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// One node instance rendered by the harness host.
pub struct Root<C> {
    component: C,
    props: Props,
    committed_props: Option<Props>,
    cx: RenderCx,
    output: Option<String>,
    renders: usize,
    mounted: bool,
}

impl<C: Component<RenderCx>> Root<C> {
    /// Render and commit.
    pub fn render(&mut self) -> Result<&str> {
        self.render_uncommitted()?;
        self.commit()?;
        Ok(self.output.as_deref().unwrap_or_default())
    }

    /// Render without committing: effects stay queued until [`commit`](Self::commit).
    pub fn render_uncommitted(&mut self) -> Result<()> {
        self.cx.begin_render();
        let node = self.component.render(&mut self.cx, &self.props)?;
        self.renders += 1;
        tracing::trace!(render = self.renders, "root rendered");
        self.output = Some(node);
        Ok(())
    }

    /// Run the effects queued by the last render.
    pub fn commit(&mut self) -> Result<()> {
        self.mounted = true;
        self.committed_props = Some(self.props.clone());
        self.cx.commit()?;
        Ok(())
    }

    /// Parent-driven update. Returns `false` when the component reported the
    /// props unchanged and the render was skipped.
    pub fn set_props(&mut self, props: Props) -> Result<bool> {
        let skip = self
            .committed_props
            .as_ref()
            .is_some_and(|prev| self.component.props_unchanged(prev, &props));
        self.props = props;
        if skip {
            tracing::trace!("parent render skipped: props unchanged");
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Render again while the node keeps requesting re-renders. Returns the
    /// number of renders performed.
    pub fn settle(&mut self) -> Result<usize> {
        let mut renders = 0;
        while self.cx.is_dirty() && renders < MAX_SETTLE_RENDERS {
            self.render()?;
            renders += 1;
        }
        if self.cx.is_dirty() {
            tracing::warn!(renders, "root still dirty after settle limit");
        }
        Ok(renders)
    }

    /// Run effect cleanups. The root can be rendered again afterwards as a
    /// fresh mount of the same hook slots.
    pub fn unmount(&mut self) -> Result<()> {
        self.mounted = false;
        self.committed_props = None;
        self.cx.unmount()?;
        Ok(())
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Re-render requests received from the node so far.
    #[must_use]
    pub fn rerender_requests(&self) -> usize {
        self.cx.rerender_requests()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cx.is_dirty()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the last render queued effects that have not been committed.
    #[must_use]
    pub fn has_pending_commit(&self) -> bool {
        self.cx.has_queued_effects()
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}
