//! Manually advanced time and the timer queue that runs on it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use autobind_core::host::{Scheduler, Task, TimeoutId};
use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset_us: Rc<Cell<u64>>,
}

impl LabClock {
    /// Create a new lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_us: Rc::new(Cell::new(0)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let us = delta.as_micros().min(u128::from(u64::MAX)) as u64;
        self.offset_us.set(self.offset_us.get().saturating_add(us));
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.offset_us.get())
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.epoch + self.elapsed()
    }

    fn offset_us(&self) -> u64 {
        self.offset_us.get()
    }

    fn set_offset_us(&self, us: u64) {
        self.offset_us.set(us);
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

struct Timer {
    due_us: u64,
    id: TimeoutId,
    task: Task,
}

/// Timers driven by a [`LabClock`]. Nothing runs until [`advance`](Self::advance).
pub struct LabScheduler {
    clock: LabClock,
    next_id: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
}

impl LabScheduler {
    #[must_use]
    pub fn new(clock: LabClock) -> Self {
        Self {
            clock,
            next_id: Cell::new(1),
            timers: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn clock(&self) -> &LabClock {
        &self.clock
    }

    /// Timers scheduled and not yet run or cleared.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move time forward by `delta`, running every timer that comes due, in
    /// due order (ties in scheduling order).
    ///
    /// Every due timer runs even when an earlier one fails; the first error
    /// is returned.
    pub fn advance(&self, delta: Duration) -> autobind_core::Result<usize> {
        let delta_us = delta.as_micros().min(u128::from(u64::MAX)) as u64;
        let target = self.clock.offset_us().saturating_add(delta_us);
        let mut ran = 0usize;
        let mut first_error = None;

        while let Some(timer) = self.take_next_due(target) {
            self.clock.set_offset_us(timer.due_us.max(self.clock.offset_us()));
            tracing::trace!(timeout_id = timer.id.0, "lab timer fired");
            ran += 1;
            if let Err(err) = (timer.task)() {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::warn!(error = %err, "lab timer failed");
                }
            }
        }
        self.clock.set_offset_us(target);
        first_error.map_or(Ok(ran), Err)
    }

    fn take_next_due(&self, target: u64) -> Option<Timer> {
        let mut timers = self.timers.borrow_mut();
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_us <= target)
            .min_by_key(|(_, t)| (t.due_us, t.id))
            .map(|(i, _)| i)?;
        Some(timers.remove(index))
    }
}

impl Scheduler for LabScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimeoutId {
        let id = TimeoutId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let delay_us = delay.as_micros().min(u128::from(u64::MAX)) as u64;
        self.timers.borrow_mut().push(Timer {
            due_us: self.clock.offset_us().saturating_add(delay_us),
            id,
            task,
        });
        id
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.timers.borrow_mut().retain(|t| t.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_clock_advances() {
        let clock = LabClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
        assert_eq!(clock.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn timers_fire_in_due_order() {
        let scheduler = LabScheduler::new(LabClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        for (label, ms) in [("late", 30u64), ("early", 10), ("mid", 20)] {
            let log = Rc::clone(&log);
            scheduler.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || {
                    log.borrow_mut().push(label);
                    Ok(())
                }),
            );
        }
        assert_eq!(scheduler.advance(Duration::from_millis(15)).unwrap(), 1);
        assert_eq!(scheduler.advance(Duration::from_millis(100)).unwrap(), 2);
        assert_eq!(*log.borrow(), vec!["early", "mid", "late"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cleared_timer_never_fires() {
        let scheduler = LabScheduler::new(LabClock::new());
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let id = scheduler.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                f.set(true);
                Ok(())
            }),
        );
        scheduler.clear_timeout(id);
        scheduler.clear_timeout(TimeoutId(999));
        scheduler.advance(Duration::from_secs(1)).unwrap();
        assert!(!fired.get());
    }

    #[test]
    fn timer_sees_its_due_time() {
        let scheduler = Rc::new(LabScheduler::new(LabClock::new()));
        let seen = Rc::new(Cell::new(Duration::ZERO));
        let (s, clock) = (Rc::clone(&seen), scheduler.clock().clone());
        scheduler.set_timeout(
            Duration::from_millis(40),
            Box::new(move || {
                s.set(clock.elapsed());
                Ok(())
            }),
        );
        scheduler.advance(Duration::from_millis(100)).unwrap();
        assert_eq!(seen.get(), Duration::from_millis(40));
        assert_eq!(scheduler.clock().elapsed(), Duration::from_millis(100));
    }
}
