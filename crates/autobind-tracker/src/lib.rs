#![forbid(unsafe_code)]

//! Transparent reactive computations.
//!
//! This crate is the reactive engine that `autobind-core` binds UI nodes to:
//!
//! - [`autorun`]: run a function now and again whenever any reactive data it
//!   read during its last run changes.
//! - [`Computation`]: handle to one autorun. Stopping is idempotent.
//! - [`Dependency`]: the primitive a data source uses to record readers and
//!   invalidate them on change.
//! - [`ReactiveVar`]: a single reactive value built on [`Dependency`].
//! - [`SubscriptionHub`]: named, argument-keyed subscriptions whose lifetime
//!   follows the computation that requested them.
//!
//! # Architecture
//!
//! All state lives in a thread-local context: the current computation, the
//! queue of invalidated computations and the after-flush callbacks. Nothing
//! is `Send`; one UI thread owns one tracker.
//!
//! Invalidated computations are not re-run immediately. They are queued and
//! re-run when [`flush`] is called, in invalidation order.
//!
//! # Invariants
//!
//! 1. A computation is queued at most once per invalidation.
//! 2. A stopped computation never runs again.
//! 3. An autorun created while another computation is running is stopped
//!    when that outer computation is invalidated, unless it was created
//!    inside [`nonreactive`].
//! 4. `flush` is not re-entrant.

pub mod computation;
pub mod dependency;
pub mod error;
pub mod subscription;
pub mod tracker;
pub mod var;

pub use computation::Computation;
pub use dependency::Dependency;
pub use error::{BoxError, Result, TrackerError};
pub use subscription::{SubscriptionHandle, SubscriptionHub, SubscriptionId};
pub use tracker::{
    Tracker, active, after_flush, autorun, current_computation, flush, nonreactive,
    pending_count,
};
pub use var::ReactiveVar;
