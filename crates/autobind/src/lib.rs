#![forbid(unsafe_code)]

//! autobind public facade crate.
//!
//! Re-exports the binding API from `autobind-core` and, with the default
//! `tracker` feature, the bundled reactive engine.

pub use autobind_core::*;

#[cfg(feature = "tracker")]
pub use autobind_tracker as tracker;

pub mod prelude {
    pub use autobind_core::{
        Component, DepList, InjectConfig, Props, RenderContext, Status, TrackerHandle,
        TrackerOptions, Value, deps, use_controlled_tracker, use_tracker, with_tracker,
    };

    #[cfg(feature = "tracker")]
    pub use autobind_tracker::{ReactiveVar, Tracker};
}
