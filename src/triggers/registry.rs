//! Trigger registry.
//!
//! Holds the active triggers of one bus. Triggers are advanced in the order
//! they were added; that order is also the firing order when several
//! triggers come due on the same tick. Removal is by [`TriggerId`], so two
//! triggers with identical settings are still independent.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::events::Event;

use super::trigger::{EventTrigger, TriggerState};

/// Unique identifier for a registered trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// Insertion-ordered list of ids, inline for the common small case.
pub type TriggerIds = SmallVec<[TriggerId; 8]>;

/// Registry for active triggers.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    /// All active triggers.
    triggers: FxHashMap<TriggerId, EventTrigger>,

    /// Insertion order.
    order: Vec<TriggerId>,

    /// Next trigger ID to allocate.
    next_id: u64,
}

impl TriggerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger, returns its ID.
    pub fn add(&mut self, trigger: EventTrigger) -> TriggerId {
        let id = TriggerId::new(self.next_id);
        self.next_id += 1;

        debug!(
            trigger = %id,
            name = trigger.name(),
            delay = ?trigger.delay(),
            limit = ?trigger.limit(),
            "trigger added"
        );
        self.triggers.insert(id, trigger);
        self.order.push(id);
        id
    }

    /// Remove a trigger. Returns `None` if it was not registered.
    pub fn remove(&mut self, id: TriggerId) -> Option<EventTrigger> {
        let trigger = self.triggers.remove(&id)?;
        self.order.retain(|&t| t != id);
        Some(trigger)
    }

    /// Get a trigger by ID.
    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&EventTrigger> {
        self.triggers.get(&id)
    }

    /// Is the trigger still registered?
    #[must_use]
    pub fn contains(&self, id: TriggerId) -> bool {
        self.triggers.contains_key(&id)
    }

    /// Snapshot of the active ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> TriggerIds {
        self.order.iter().copied().collect()
    }

    /// Advance one trigger by `dt`.
    ///
    /// Returns the event to fire if the trigger came due. A trigger that
    /// fired for the last time is removed before its event is returned.
    /// Unknown ids (e.g. removed earlier in the same pass) return `None`.
    pub fn advance(&mut self, id: TriggerId, dt: Duration) -> Option<Event> {
        let trigger = self.triggers.get_mut(&id)?;

        match trigger.advance(dt) {
            TriggerState::Waiting => None,
            TriggerState::Fired => {
                debug!(trigger = %id, fired = trigger.fired_count(), "trigger fired");
                Some(trigger.make_event())
            }
            TriggerState::Expired => {
                let event = trigger.make_event();
                debug!(trigger = %id, fired = trigger.fired_count(), "trigger expired");
                self.remove(id);
                Some(event)
            }
        }
    }

    /// Give one trigger `dt` without letting it fire. Returns `false` for
    /// unknown ids.
    pub fn accrue(&mut self, id: TriggerId, dt: Duration) -> bool {
        match self.triggers.get_mut(&id) {
            Some(trigger) => {
                trigger.accrue(dt);
                true
            }
            None => false,
        }
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate triggers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TriggerId, &EventTrigger)> {
        self.order
            .iter()
            .filter_map(|id| self.triggers.get(id).map(|t| (*id, t)))
    }

    /// Remove every trigger.
    pub fn clear(&mut self) {
        self.triggers.clear();
        self.order.clear();
    }
}
