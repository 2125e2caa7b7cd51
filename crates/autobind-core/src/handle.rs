#![forbid(unsafe_code)]

//! Lifecycle handle returned alongside a bound value.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::Result;

/// Lifecycle state of a binding.
///
/// Ordered: `Stopped < Paused < Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Status {
    /// Torn down; dependency changes never recreate the computation.
    Stopped = -1,
    /// Torn down; the next dependency change recreates the computation.
    Paused = 0,
    #[default]
    Running = 1,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }
}

/// Operations a handle forwards to its binding.
pub(crate) trait Control {
    fn status(&self) -> Status;
    fn stop(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
    fn computation_id(&self) -> Option<u64>;
}

/// Controls the computation owned by one binding.
///
/// The handle does not keep the binding alive: once the owning node unmounts
/// every operation is a no-op and [`status`](Self::status) reports
/// [`Status::Stopped`].
#[derive(Clone)]
pub struct TrackerHandle {
    control: Option<Weak<dyn Control>>,
}

impl TrackerHandle {
    pub(crate) fn attached<C: Control + 'static>(control: &Rc<C>) -> Self {
        let weak: Weak<dyn Control> = Rc::downgrade(control) as Weak<dyn Control>;
        Self {
            control: Some(weak),
        }
    }

    /// A handle bound to nothing, for one-shot rendering without tracking.
    #[must_use]
    pub fn detached() -> Self {
        Self { control: None }
    }

    fn control(&self) -> Option<Rc<dyn Control>> {
        self.control.as_ref().and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.control().map_or(Status::Stopped, |c| c.status())
    }

    /// Dispose the computation for good. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Cleanup`](crate::BindingError::Cleanup) when
    /// the creation cleanup fails. The computation is stopped regardless.
    pub fn stop(&self) -> Result<()> {
        self.control().map_or(Ok(()), |c| c.stop())
    }

    /// Dispose the computation until the dependency list changes.
    ///
    /// # Errors
    ///
    /// As [`stop`](Self::stop).
    pub fn pause(&self) -> Result<()> {
        self.control().map_or(Ok(()), |c| c.pause())
    }

    /// Recreate the computation on the next render, whatever the
    /// dependencies, and request that render.
    ///
    /// # Errors
    ///
    /// As [`stop`](Self::stop).
    pub fn resume(&self) -> Result<()> {
        self.control().map_or(Ok(()), |c| c.resume())
    }

    /// Id of the live computation, if there is one.
    #[must_use]
    pub fn computation_id(&self) -> Option<u64> {
        self.control().and_then(|c| c.computation_id())
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.control.is_none()
    }
}

impl fmt::Debug for TrackerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerHandle")
            .field("status", &self.status())
            .field("computation_id", &self.computation_id())
            .finish()
    }
}
