//! Handler table.
//!
//! Maps each event type to the handlers registered for it, in registration
//! order. Per-type lists are persistent vectors (`im::Vector`), so taking a
//! snapshot before dispatch is O(1) and handlers may freely subscribe or
//! unsubscribe while that snapshot is being walked.

use std::sync::Arc;

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::HandlerResult;

use super::bus::EventBus;
use super::event::{Event, EventTypeId};

/// An event handler.
///
/// Handlers receive the bus that is dispatching, so they can fire further
/// events (dispatched immediately, on the same call stack), subscribe,
/// unsubscribe or schedule triggers.
pub type Handler = Arc<dyn Fn(&mut EventBus, &Event) -> HandlerResult + Send + Sync>;

/// Unique identifier for one handler registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// Token returned by a subscription. Pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    event_type: EventTypeId,
    id: HandlerId,
}

impl Subscriber {
    /// The event type this registration listens to.
    #[must_use]
    pub fn event_type(&self) -> EventTypeId {
        self.event_type
    }

    /// The registration ID.
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }
}

/// A single registration inside the table.
#[derive(Clone)]
pub struct Registration {
    id: HandlerId,
    handler: Handler,
}

impl Registration {
    /// The registration ID.
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The registered handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Event type → handlers, in registration order.
#[derive(Clone, Default)]
pub struct HandlerTable {
    by_type: FxHashMap<EventTypeId, Vector<Registration>>,
    live: FxHashMap<HandlerId, EventTypeId>,
    next_id: u64,
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an event type.
    ///
    /// Registering the same handler twice (under one type or several)
    /// creates independent registrations.
    pub fn insert(&mut self, event_type: EventTypeId, handler: Handler) -> Subscriber {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        self.by_type
            .entry(event_type)
            .or_default()
            .push_back(Registration { id, handler });
        self.live.insert(id, event_type);

        Subscriber { event_type, id }
    }

    /// Remove a registration. Returns `false` if it was not present.
    pub fn remove(&mut self, subscriber: &Subscriber) -> bool {
        self.remove_where(subscriber.event_type, |r| r.id == subscriber.id)
    }

    /// Remove the earliest registration of this exact handler instance.
    pub fn remove_handler(&mut self, event_type: EventTypeId, handler: &Handler) -> bool {
        self.remove_where(event_type, |r| Arc::ptr_eq(&r.handler, handler))
    }

    fn remove_where(
        &mut self,
        event_type: EventTypeId,
        matches: impl Fn(&Registration) -> bool,
    ) -> bool {
        let Some(list) = self.by_type.get_mut(&event_type) else {
            return false;
        };
        let Some(index) = list.iter().position(matches) else {
            return false;
        };

        let removed = list.remove(index);
        self.live.remove(&removed.id);
        if list.is_empty() {
            self.by_type.remove(&event_type);
        }
        true
    }

    /// Is this registration still present?
    ///
    /// Constant time; dispatch checks every registration with it.
    #[must_use]
    pub fn contains(&self, event_type: EventTypeId, id: HandlerId) -> bool {
        self.live.get(&id) == Some(&event_type)
    }

    /// Snapshot of the handlers for an event type, in registration order.
    ///
    /// Later changes to the table do not affect the snapshot.
    #[must_use]
    pub fn snapshot(&self, event_type: EventTypeId) -> Vector<Registration> {
        self.by_type.get(&event_type).cloned().unwrap_or_default()
    }

    /// Number of handlers registered for an event type.
    #[must_use]
    pub fn count(&self, event_type: EventTypeId) -> usize {
        self.by_type.get(&event_type).map_or(0, Vector::len)
    }

    /// Total number of registrations across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vector::len).sum()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Event types with at least one handler (unordered).
    pub fn event_types(&self) -> impl Iterator<Item = EventTypeId> + '_ {
        self.by_type.keys().copied()
    }

    /// Remove every registration.
    pub fn clear(&mut self) {
        self.by_type.clear();
        self.live.clear();
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<_> = self
            .by_type
            .iter()
            .map(|(event_type, list)| (*event_type, list.len()))
            .collect();
        counts.sort();
        f.debug_struct("HandlerTable")
            .field("handlers", &counts)
            .field("next_id", &self.next_id)
            .finish()
    }
}
