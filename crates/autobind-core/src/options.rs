#![forbid(unsafe_code)]

//! Per-binding options.

use std::fmt;
use std::rc::Rc;

use web_time::Duration;

use crate::config::{self, IsEqualFn, TransformFn};
use crate::engine::Computation;
use crate::error::BoxError;

/// How long a computation created during a render may live without the node
/// committing before it is disposed.
pub const MOUNT_GUARD_DELAY: Duration = Duration::from_millis(1000);

/// Undo work started by `on_computation_created`. Runs once, before the
/// computation is replaced or stopped.
pub struct Cleanup(Box<dyn FnOnce() -> Result<(), BoxError>>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(move || {
            f();
            Ok(())
        }))
    }

    pub fn fallible(f: impl FnOnce() -> Result<(), BoxError> + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn run(self) -> Result<(), BoxError> {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

pub type OnCreatedFn = Rc<dyn Fn(&dyn Computation) -> Option<Cleanup>>;

/// Builder for [`use_controlled_tracker`](crate::binding::use_controlled_tracker).
///
/// Callbacks not set here fall back to the thread defaults installed with
/// [`config::set_default_options`], then to `PartialEq` and identity.
pub struct TrackerOptions<T> {
    pub(crate) is_equal: Option<IsEqualFn<T>>,
    pub(crate) transform: Option<TransformFn<T>>,
    pub(crate) on_computation_created: Option<OnCreatedFn>,
    pub(crate) mount_guard: Duration,
}

impl<T> TrackerOptions<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_equal: None,
            transform: None,
            on_computation_created: None,
            mount_guard: MOUNT_GUARD_DELAY,
        }
    }

    #[must_use]
    pub fn is_equal(mut self, f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.is_equal = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn transform(mut self, f: impl Fn(Option<&T>, T) -> T + 'static) -> Self {
        self.transform = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_computation_created(
        mut self,
        f: impl Fn(&dyn Computation) -> Option<Cleanup> + 'static,
    ) -> Self {
        self.on_computation_created = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn mount_guard(mut self, delay: Duration) -> Self {
        self.mount_guard = delay;
        self
    }
}

impl<T: PartialEq + 'static> TrackerOptions<T> {
    /// Fill unset callbacks from the thread defaults.
    pub(crate) fn resolve(self) -> Resolved<T> {
        let defaults = config::default_options::<T>();
        Resolved {
            is_equal: self
                .is_equal
                .or(defaults.is_equal)
                .unwrap_or_else(|| -> IsEqualFn<T> { Rc::new(|a: &T, b: &T| a == b) }),
            transform: self.transform.or(defaults.transform),
            on_computation_created: self.on_computation_created,
            mount_guard: self.mount_guard,
        }
    }
}

impl<T> Default for TrackerOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TrackerOptions<T> {
    fn clone(&self) -> Self {
        Self {
            is_equal: self.is_equal.clone(),
            transform: self.transform.clone(),
            on_computation_created: self.on_computation_created.clone(),
            mount_guard: self.mount_guard,
        }
    }
}

impl<T> fmt::Debug for TrackerOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerOptions")
            .field("is_equal", &self.is_equal.is_some())
            .field("transform", &self.transform.is_some())
            .field(
                "on_computation_created",
                &self.on_computation_created.is_some(),
            )
            .field("mount_guard", &self.mount_guard)
            .finish()
    }
}

/// Options with every default applied.
pub(crate) struct Resolved<T> {
    pub(crate) is_equal: IsEqualFn<T>,
    pub(crate) transform: Option<TransformFn<T>>,
    pub(crate) on_computation_created: Option<OnCreatedFn>,
    pub(crate) mount_guard: Duration,
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            is_equal: Rc::clone(&self.is_equal),
            transform: self.transform.clone(),
            on_computation_created: self.on_computation_created.clone(),
            mount_guard: self.mount_guard,
        }
    }
}

impl<T> Resolved<T> {
    pub(crate) fn apply_transform(&self, previous: Option<&T>, next: T) -> T {
        match &self.transform {
            Some(transform) => transform(previous, next),
            None => next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultOptions, clear_default_options, set_default_options};

    #[derive(Clone, PartialEq)]
    struct Marker(u8);

    #[test]
    fn partial_eq_is_the_fallback() {
        let resolved = TrackerOptions::<Marker>::new().resolve();
        assert!((resolved.is_equal)(&Marker(1), &Marker(1)));
        assert!(!(resolved.is_equal)(&Marker(1), &Marker(2)));
        assert_eq!(resolved.apply_transform(None, Marker(3)).0, 3);
    }

    #[test]
    fn thread_defaults_fill_gaps() {
        set_default_options::<Marker>(
            DefaultOptions::new()
                .is_equal(|_, _| true)
                .transform(|_, m: Marker| Marker(m.0 + 1)),
        );
        let resolved = TrackerOptions::<Marker>::new().resolve();
        assert!((resolved.is_equal)(&Marker(1), &Marker(2)));
        assert_eq!(resolved.apply_transform(None, Marker(1)).0, 2);
        clear_default_options::<Marker>();
    }

    #[test]
    fn explicit_options_win() {
        set_default_options::<Marker>(DefaultOptions::new().is_equal(|_, _| true));
        let resolved = TrackerOptions::<Marker>::new()
            .is_equal(|_, _| false)
            .resolve();
        assert!(!(resolved.is_equal)(&Marker(1), &Marker(1)));
        clear_default_options::<Marker>();
    }

    #[test]
    fn mount_guard_defaults_to_one_second() {
        assert_eq!(TrackerOptions::<Marker>::new().mount_guard, MOUNT_GUARD_DELAY);
        assert_eq!(MOUNT_GUARD_DELAY, Duration::from_millis(1000));
    }
}
