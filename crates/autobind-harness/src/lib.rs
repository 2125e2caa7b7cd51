#![forbid(unsafe_code)]

//! Deterministic host for exercising autobind bindings.
//!
//! - [`Harness`] owns a [`LabClock`] and the timer queue bindings schedule
//!   their mount guards on. Time only moves through [`Harness::advance`].
//! - [`Root`] renders one component, commits its effects, and re-renders it
//!   on request through [`Root::settle`].
//!
//! Rendering is explicit: a binding asking for a re-render only marks the
//! root dirty.
//!
//! ```ignore
//! let harness = Harness::new();
//! let mut root = harness.root(component, Props::new());
//! root.render()?;
//! source.set("bbb".into());
//! harness.flush()?;
//! root.settle()?;
//! ```

pub mod clock;
pub mod error;
pub mod render;
pub mod root;

pub use clock::{LabClock, LabScheduler};
pub use error::{HarnessError, Result};
pub use render::{FnComponent, RenderCx, component};
pub use root::{Harness, Root};
