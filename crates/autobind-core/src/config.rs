#![forbid(unsafe_code)]

//! Process-wide defaults, scoped to the UI thread.
//!
//! Defaults are looked up when a binding resolves its options, so they must be
//! installed during application setup, before the first render. They are
//! stored per thread and are not synchronized: a binding on one thread never
//! observes defaults set on another.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

/// Equality callback: `true` means "no change, skip the re-render".
pub type IsEqualFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Transform callback: `(previous, next) -> next'`.
pub type TransformFn<T> = Rc<dyn Fn(Option<&T>, T) -> T>;

/// Default callbacks for every binding producing a `T`.
pub struct DefaultOptions<T> {
    pub is_equal: Option<IsEqualFn<T>>,
    pub transform: Option<TransformFn<T>>,
}

impl<T> DefaultOptions<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_equal: None,
            transform: None,
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
}

impl<T> Default for DefaultOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DefaultOptions<T> {
    fn clone(&self) -> Self {
        Self {
            is_equal: self.is_equal.clone(),
            transform: self.transform.clone(),
        }
    }
}

impl<T> fmt::Debug for DefaultOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultOptions")
            .field("is_equal", &self.is_equal.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Whether usage diagnostics are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostics {
    Enabled,
    Disabled,
}

impl Default for Diagnostics {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

thread_local! {
    static DEFAULTS: RefCell<AHashMap<TypeId, Box<dyn Any>>> = RefCell::new(AHashMap::new());
    static DIAGNOSTICS: Cell<Option<Diagnostics>> = const { Cell::new(None) };
}

/// Install defaults for bindings producing `T`, replacing earlier ones.
pub fn set_default_options<T: 'static>(options: DefaultOptions<T>) {
    tracing::debug!(
        value_type = std::any::type_name::<T>(),
        is_equal = options.is_equal.is_some(),
        transform = options.transform.is_some(),
        "default options installed"
    );
    DEFAULTS.with(|d| {
        d.borrow_mut().insert(TypeId::of::<T>(), Box::new(options));
    });
}

/// Current defaults for `T` (empty when none were installed).
#[must_use]
pub fn default_options<T: 'static>() -> DefaultOptions<T> {
    DEFAULTS.with(|d| {
        d.borrow()
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<DefaultOptions<T>>())
            .cloned()
            .unwrap_or_default()
    })
}

pub fn clear_default_options<T: 'static>() {
    DEFAULTS.with(|d| {
        d.borrow_mut().remove(&TypeId::of::<T>());
    });
}

pub fn set_diagnostics(mode: Diagnostics) {
    DIAGNOSTICS.with(|d| d.set(Some(mode)));
}

#[must_use]
pub fn diagnostics() -> Diagnostics {
    DIAGNOSTICS.with(|d| d.get()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_per_type() {
        set_default_options::<u32>(DefaultOptions::new().is_equal(|_, _| true));
        assert!(default_options::<u32>().is_equal.is_some());
        assert!(default_options::<i32>().is_equal.is_none());
        clear_default_options::<u32>();
        assert!(default_options::<u32>().is_equal.is_none());
    }

    #[test]
    fn transform_default_is_callable() {
        set_default_options::<String>(
            DefaultOptions::new().transform(|_, next: String| next.to_uppercase()),
        );
        let transform = default_options::<String>().transform;
        let out = transform.map(|t| t(None, "abc".into()));
        assert_eq!(out.as_deref(), Some("ABC"));
        clear_default_options::<String>();
    }

    #[test]
    fn diagnostics_override() {
        set_diagnostics(Diagnostics::Disabled);
        assert_eq!(diagnostics(), Diagnostics::Disabled);
        set_diagnostics(Diagnostics::Enabled);
        assert_eq!(diagnostics(), Diagnostics::Enabled);
    }

    #[test]
    fn defaults_do_not_leak_across_threads() {
        set_default_options::<u64>(DefaultOptions::new().is_equal(|_, _| true));
        let seen = std::thread::spawn(|| default_options::<u64>().is_equal.is_some())
            .join()
            .unwrap_or(true);
        assert!(!seen);
        clear_default_options::<u64>();
    }
}
