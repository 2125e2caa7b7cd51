#![forbid(unsafe_code)]

//! Bind reactive computations to the render cycle of hook-based UI nodes.
//!
//! # Role in autobind
//! `autobind-core` sits between a reactive engine (anything implementing
//! [`ReactiveEngine`], with `autobind-tracker` bundled behind the `tracker`
//! feature) and a UI host (anything implementing [`RenderContext`]).
//!
//! # Primary responsibilities
//! - **Binding**: [`use_controlled_tracker`] owns one computation per node
//!   instance, recreates it when the dependency list changes and requests a
//!   re-render when its value changes.
//! - **Handle**: [`TrackerHandle`] stops, pauses and resumes the computation.
//! - **Injection**: [`with_tracker`] and [`make_injector`] wrap a component so
//!   derived props are merged into its own.
//! - **Dependency lists**: [`DepList`] and [`are_deps_equal`].
//! - **Defaults and diagnostics**: [`config`].
//!
//! # Quick start
//!
//! ```ignore
//! use autobind_core::{use_tracker, deps};
//!
//! let title = use_tracker(cx, &engine, move || doc.get().title, deps![doc_id])?;
//! ```

pub mod binding;
pub mod config;
pub mod deps;
mod diagnostics;
pub mod engine;
pub mod error;
pub mod handle;
pub mod host;
pub mod inject;
pub mod options;
pub mod props;
pub mod value;

pub use binding::{use_controlled_tracker, use_tracker};
pub use config::{DefaultOptions, Diagnostics};
pub use deps::{DepList, are_deps_equal, are_deps_equal_by};
pub use engine::{Computation, ReactiveEngine};
pub use error::{BindingError, BoxError, Result};
pub use handle::{Status, TrackerHandle};
pub use host::{Component, Effect, EffectCleanup, RenderContext, Rerender, Scheduler, TimeoutId};
pub use inject::{
    Binder, Enhancer, InjectConfig, InjectOptions, Injector, StaticBinder, TrackerBinder,
    WithTracker, make_injector, with_tracker,
};
pub use options::{Cleanup, MOUNT_GUARD_DELAY, TrackerOptions};
pub use props::{NodeRef, Props};
pub use value::{MAX_SAFE_INTEGER, Opaque, OpaqueKind, Value};
