#![forbid(unsafe_code)]

//! The reactive engine a binding drives.
//!
//! The binding needs very little from an engine: start an autorun, read
//! whether the current run is the first, stop it, and run a closure with
//! dependency tracking suspended. Anything offering those four operations
//! can back a binding; `autobind-tracker` is the bundled implementation.

use crate::error::BoxError;

/// One live autorun, as seen by the binding.
pub trait Computation {
    /// Stable id, used in logs and by [`TrackerHandle::computation_id`].
    ///
    /// [`TrackerHandle::computation_id`]: crate::handle::TrackerHandle::computation_id
    fn id(&self) -> u64;

    /// `true` during the synchronous run started by `autorun`.
    fn first_run(&self) -> bool;

    fn is_stopped(&self) -> bool;

    /// Stop the computation. Idempotent.
    fn stop(&self);
}

/// Run callback handed to [`ReactiveEngine::autorun`].
pub type RunFn<C> = Box<dyn FnMut(&C) -> Result<(), BoxError>>;

pub trait ReactiveEngine: Clone + 'static {
    type Computation: Computation + Clone + 'static;

    /// Create a computation and run `run` once, synchronously. Later runs
    /// happen whenever the data read by the last run changes.
    fn autorun(&self, run: RunFn<Self::Computation>) -> Result<Self::Computation, BoxError>;

    /// Run `f` with no current computation.
    fn nonreactive<R>(&self, f: impl FnOnce() -> R) -> R;
}

#[cfg(feature = "tracker")]
mod tracker_impl {
    use super::{Computation, ReactiveEngine, RunFn};
    use crate::error::BoxError;

    impl Computation for autobind_tracker::Computation {
        fn id(&self) -> u64 {
            autobind_tracker::Computation::id(self)
        }

        fn first_run(&self) -> bool {
            autobind_tracker::Computation::first_run(self)
        }

        fn is_stopped(&self) -> bool {
            autobind_tracker::Computation::is_stopped(self)
        }

        fn stop(&self) {
            autobind_tracker::Computation::stop(self);
        }
    }

    impl ReactiveEngine for autobind_tracker::Tracker {
        type Computation = autobind_tracker::Computation;

        fn autorun(
            &self,
            run: RunFn<Self::Computation>,
        ) -> Result<Self::Computation, BoxError> {
            // Hand back the run function's own error so the binding can
            // recognise the errors it raised itself.
            autobind_tracker::autorun(run).map_err(|err| match err {
                autobind_tracker::TrackerError::Run { source, .. } => source,
                other => Box::new(other) as BoxError,
            })
        }

        fn nonreactive<R>(&self, f: impl FnOnce() -> R) -> R {
            autobind_tracker::nonreactive(f)
        }
    }
}
