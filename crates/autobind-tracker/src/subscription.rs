#![forbid(unsafe_code)]

//! Named subscriptions whose lifetime follows the requesting computation.
//!
//! A subscription is keyed by name and arguments. When a computation that
//! requested it is invalidated, the subscription is marked inactive. If the
//! re-run asks for the same name and arguments, the inactive subscription
//! is revived under its existing id and a fresh [`SubscriptionHandle`] is
//! returned. Subscriptions still inactive when the flush finishes are
//! stopped.
//!
//! Readiness is reactive: [`SubscriptionHandle::ready`] registers the
//! current computation and [`SubscriptionHub::mark_ready`] invalidates it.
//!
//! # Invariants
//!
//! 1. A subscription id is never reused for different arguments.
//! 2. A subscription requested outside any computation lives until stopped.
//! 3. Readiness only moves from `false` to `true`; a new id always starts
//!    not ready.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::dependency::Dependency;
use crate::tracker;

/// Identity of a subscription, stable across re-runs that keep its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

struct Record {
    name: String,
    args: Vec<String>,
    ready: bool,
    ready_dep: Dependency,
    inactive: bool,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscriptions: AHashMap<SubscriptionId, Record>,
}

/// Registry of live subscriptions.
#[derive(Clone, Default)]
pub struct SubscriptionHub {
    state: Rc<RefCell<HubState>>,
}

impl fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("active", &self.state.borrow().subscriptions.len())
            .finish()
    }
}

impl SubscriptionHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a subscription, reviving an inactive one with equal arguments.
    pub fn subscribe<S: AsRef<str>>(&self, name: &str, args: &[S]) -> SubscriptionHandle {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_owned()).collect();

        let id = {
            let mut state = self.state.borrow_mut();
            let revived = state
                .subscriptions
                .iter_mut()
                .find(|(_, rec)| rec.inactive && rec.name == name && rec.args == args)
                .map(|(id, rec)| {
                    rec.inactive = false;
                    *id
                });
            match revived {
                Some(id) => id,
                None => {
                    state.next_id += 1;
                    let id = SubscriptionId(state.next_id);
                    state.subscriptions.insert(
                        id,
                        Record {
                            name: name.to_owned(),
                            args,
                            ready: false,
                            ready_dep: Dependency::new(),
                            inactive: false,
                        },
                    );
                    tracing::debug!(subscription_id = id.0, name, "subscription started");
                    id
                }
            }
        };

        if let Some(computation) = tracker::current_computation() {
            let weak = Rc::downgrade(&self.state);
            computation.on_invalidate(move |_| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if let Some(rec) = state.borrow_mut().subscriptions.get_mut(&id) {
                    rec.inactive = true;
                }
                let weak = Rc::downgrade(&state);
                tracker::after_flush(move || {
                    let Some(state) = weak.upgrade() else {
                        return;
                    };
                    let still_inactive = state
                        .borrow()
                        .subscriptions
                        .get(&id)
                        .is_some_and(|rec| rec.inactive);
                    if still_inactive {
                        stop_subscription(&state, id);
                    }
                });
            });
        }

        SubscriptionHandle {
            id,
            hub: Rc::downgrade(&self.state),
        }
    }

    /// Signal that the data for `id` has arrived.
    pub fn mark_ready(&self, id: SubscriptionId) {
        let dep = {
            let mut state = self.state.borrow_mut();
            match state.subscriptions.get_mut(&id) {
                Some(rec) if !rec.ready => {
                    rec.ready = true;
                    rec.ready_dep.clone()
                }
                _ => return,
            }
        };
        dep.changed();
    }

    #[must_use]
    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.state.borrow().subscriptions.contains_key(&id)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn stop_subscription(state: &Rc<RefCell<HubState>>, id: SubscriptionId) {
    let removed = state.borrow_mut().subscriptions.remove(&id);
    if let Some(rec) = removed {
        tracing::debug!(subscription_id = id.0, name = %rec.name, "subscription stopped");
        rec.ready_dep.changed();
    }
}

/// One request's view of a subscription.
///
/// Each `subscribe` call returns a new handle, even when the underlying
/// subscription (and its [`SubscriptionId`]) is reused.
pub struct SubscriptionHandle {
    id: SubscriptionId,
    hub: Weak<RefCell<HubState>>,
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish()
    }
}

impl SubscriptionHandle {
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the subscription's data has arrived. Reactive.
    #[must_use]
    pub fn ready(&self) -> bool {
        let Some(state) = self.hub.upgrade() else {
            return false;
        };
        let (ready, dep) = match state.borrow().subscriptions.get(&self.id) {
            Some(rec) => (rec.ready, rec.ready_dep.clone()),
            None => return false,
        };
        dep.depend();
        ready
    }

    pub fn stop(&self) {
        if let Some(state) = self.hub.upgrade() {
            stop_subscription(&state, self.id);
        }
    }
}
