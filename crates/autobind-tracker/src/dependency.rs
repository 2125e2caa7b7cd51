#![forbid(unsafe_code)]

//! Reader bookkeeping for reactive data sources.
//!
//! A data source owns a [`Dependency`], calls [`Dependency::depend`] on every
//! read and [`Dependency::changed`] on every write. Dependents are keyed by
//! computation id and drop out automatically when the computation is
//! invalidated, so a stopped computation never stays registered.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::computation::Computation;
use crate::tracker;

type Dependents = RefCell<AHashMap<u64, Computation>>;

/// Set of computations that read a data source since their last run.
#[derive(Clone, Default)]
pub struct Dependency {
    dependents: Rc<Dependents>,
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("dependents", &self.dependents.borrow().len())
            .finish()
    }
}

impl Dependency {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current computation as a dependent.
    ///
    /// Returns `true` if a new dependent was added.
    pub fn depend(&self) -> bool {
        match tracker::current_computation() {
            Some(computation) => self.depend_on(&computation),
            None => false,
        }
    }

    /// Record `computation` as a dependent.
    pub fn depend_on(&self, computation: &Computation) -> bool {
        let id = computation.id();
        {
            let mut dependents = self.dependents.borrow_mut();
            if dependents.contains_key(&id) {
                return false;
            }
            dependents.insert(id, computation.clone());
        }
        let weak: Weak<Dependents> = Rc::downgrade(&self.dependents);
        computation.on_invalidate(move |_| {
            if let Some(dependents) = weak.upgrade() {
                dependents.borrow_mut().remove(&id);
            }
        });
        true
    }

    /// Invalidate every dependent.
    pub fn changed(&self) {
        let dependents: Vec<Computation> = self.dependents.borrow().values().cloned().collect();
        for computation in dependents {
            computation.invalidate();
        }
    }

    #[must_use]
    pub fn has_dependents(&self) -> bool {
        !self.dependents.borrow().is_empty()
    }

    #[must_use]
    pub fn num_dependents(&self) -> usize {
        self.dependents.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{autorun, flush};

    #[test]
    fn depend_outside_computation_is_noop() {
        let dep = Dependency::new();
        assert!(!dep.depend());
        assert!(!dep.has_dependents());
    }

    #[test]
    fn depend_registers_once() {
        let dep = Dependency::new();
        let d = dep.clone();
        let c = autorun(move |_| {
            assert!(d.depend());
            assert!(!d.depend());
            Ok(())
        })
        .unwrap();
        assert_eq!(dep.num_dependents(), 1);
        c.stop();
        assert_eq!(dep.num_dependents(), 0);
    }

    #[test]
    fn changed_invalidates_and_rerun_reregisters() {
        let dep = Dependency::new();
        let d = dep.clone();
        let c = autorun(move |_| {
            d.depend();
            Ok(())
        })
        .unwrap();
        dep.changed();
        assert!(c.is_invalidated());
        assert_eq!(dep.num_dependents(), 0);
        flush().unwrap();
        assert_eq!(dep.num_dependents(), 1);
        c.stop();
    }
}
