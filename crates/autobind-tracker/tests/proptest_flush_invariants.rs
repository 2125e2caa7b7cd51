//! Property-based invariant tests for flush.
//!
//! For any set of autoruns each summing a subset of reactive vars, and any
//! sequence of writes:
//!
//! 1. After `flush`, every autorun has observed the current values.
//! 2. A flush re-runs a computation at most once per invalidation batch.
//! 3. Computations whose vars were not written do not re-run.
//! 4. After stopping every computation, no var has listeners.

use std::cell::Cell;
use std::rc::Rc;

use autobind_tracker::{ReactiveVar, autorun, flush, pending_count};
use proptest::prelude::*;

const VARS: usize = 4;

proptest! {
    #[test]
    fn flush_brings_every_autorun_up_to_date(
        readers in proptest::collection::vec(proptest::collection::btree_set(0..VARS, 1..=VARS), 1..6),
        writes in proptest::collection::vec((0..VARS, -100i64..100), 0..20),
    ) {
        let vars: Vec<ReactiveVar<i64>> = (0..VARS).map(|_| ReactiveVar::new(0)).collect();

        let mut observed = Vec::new();
        let mut runs = Vec::new();
        let mut computations = Vec::new();
        for set in &readers {
            let seen = Rc::new(Cell::new(0i64));
            let count = Rc::new(Cell::new(0u32));
            let (s, c) = (Rc::clone(&seen), Rc::clone(&count));
            let read: Vec<ReactiveVar<i64>> = set.iter().map(|&i| vars[i].clone()).collect();
            let computation = autorun(move |_| {
                c.set(c.get() + 1);
                s.set(read.iter().map(ReactiveVar::get).sum());
                Ok(())
            })
            .unwrap();
            observed.push(seen);
            runs.push(count);
            computations.push(computation);
        }

        let mut touched = [false; VARS];
        for &(index, value) in &writes {
            let before = vars[index].peek();
            vars[index].set(value);
            if before != value {
                touched[index] = true;
            }
        }
        flush().unwrap();
        prop_assert_eq!(pending_count(), 0);

        for (i, set) in readers.iter().enumerate() {
            let expected: i64 = set.iter().map(|&v| vars[v].peek()).sum();
            prop_assert_eq!(observed[i].get(), expected);
            let was_touched = set.iter().any(|&v| touched[v]);
            prop_assert_eq!(runs[i].get(), if was_touched { 2 } else { 1 });
        }

        for computation in &computations {
            computation.stop();
        }
        for var in &vars {
            prop_assert_eq!(var.num_listeners(), 0);
        }
    }
}
