#![forbid(unsafe_code)]

//! Single reactive values.
//!
//! # Invariants
//!
//! 1. `get()` inside a computation registers that computation as a listener.
//! 2. Setting a value equal to the current one is a no-op: no version bump,
//!    no invalidation.
//! 3. `version()` increments exactly once per effective `set`.
//!
//! # Example
//!
//! ```
//! use autobind_tracker::{ReactiveVar, autorun, flush};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let name = ReactiveVar::new("aaa".to_string());
//! let seen = Rc::new(Cell::new(0));
//! let (n, s) = (name.clone(), Rc::clone(&seen));
//! let c = autorun(move |_| {
//!     n.get();
//!     s.set(s.get() + 1);
//!     Ok(())
//! })
//! .unwrap();
//!
//! name.set("bbb".to_string());
//! flush().unwrap();
//! assert_eq!(seen.get(), 2);
//! c.stop();
//! assert_eq!(name.num_listeners(), 0);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::dependency::Dependency;

struct VarInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    dep: Dependency,
}

/// A shared reactive value. Clones share the same value.
pub struct ReactiveVar<T> {
    inner: Rc<VarInner<T>>,
}

impl<T> Clone for ReactiveVar<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveVar")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("listeners", &self.inner.dep.num_dependents())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveVar<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(VarInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                dep: Dependency::new(),
            }),
        }
    }

    /// Read the value, registering the current computation as a listener.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.dep.depend();
        self.inner.value.borrow().clone()
    }

    /// Read by reference, registering the current computation as a listener.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.depend();
        f(&self.inner.value.borrow())
    }

    /// Read without registering a listener.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value, invalidating listeners if it changed.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.dep.changed();
    }

    /// Modify the value in place through a clone, then `set` it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.peek();
        f(&mut next);
        self.set(next);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of computations currently listening.
    #[must_use]
    pub fn num_listeners(&self) -> usize {
        self.inner.dep.num_dependents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{autorun, flush};

    #[test]
    fn set_equal_value_is_noop() {
        let var = ReactiveVar::new(42);
        let v = var.clone();
        let c = autorun(move |_| {
            v.get();
            Ok(())
        })
        .unwrap();
        var.set(42);
        assert_eq!(var.version(), 0);
        assert!(!c.is_invalidated());
        c.stop();
    }

    #[test]
    fn version_counts_changes() {
        let var = ReactiveVar::new(0);
        for i in 1..=5 {
            var.set(i);
        }
        assert_eq!(var.version(), 5);
        var.update(|v| *v += 10);
        assert_eq!(var.peek(), 15);
        assert_eq!(var.version(), 6);
    }

    #[test]
    fn peek_does_not_listen() {
        let var = ReactiveVar::new("x".to_string());
        let v = var.clone();
        let c = autorun(move |_| {
            let _ = v.peek();
            Ok(())
        })
        .unwrap();
        assert_eq!(var.num_listeners(), 0);
        c.stop();
    }

    #[test]
    fn listeners_follow_computation_lifetime() {
        let var = ReactiveVar::new(vec![1, 2, 3]);
        let v = var.clone();
        let c = autorun(move |_| {
            v.with(|items| items.len());
            Ok(())
        })
        .unwrap();
        assert_eq!(var.num_listeners(), 1);
        var.set(vec![4]);
        flush().unwrap();
        assert_eq!(var.num_listeners(), 1);
        c.stop();
        assert_eq!(var.num_listeners(), 0);
    }

    #[test]
    fn clone_shares_state() {
        let a = ReactiveVar::new(1);
        let b = a.clone();
        b.set(2);
        assert_eq!(a.peek(), 2);
    }
}
