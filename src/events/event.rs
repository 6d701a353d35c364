//! Event types.
//!
//! Events represent things that happen during a simulation. The bus provides
//! the dispatch infrastructure; games define what events exist via
//! `EventTypeId`.
//!
//! ## Design Philosophy
//!
//! Event types are game-defined, not hardcoded. The bus doesn't know about
//! "enemy spawned" or "wave cleared". Games pick ids, optionally name them
//! in [`BusConfig`](crate::core::BusConfig), and fire them appropriately.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PropertyValue};

/// Event type identifier. Games define what event types exist.
///
/// This is the dispatch key: handlers are registered per event type and an
/// event reaches only the handlers of its exact type.
///
/// ## Example Event Types
///
/// A typical game might define:
/// - `ENEMY_SPAWNED` - A new enemy entered the world
/// - `PICKUP_COLLECTED` - The player collected an item
/// - `WAVE_CLEARED` - All enemies of a wave are gone
/// - `TIMER_ELAPSED` - A scheduled trigger fired
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventTypeId(pub u32);

impl EventTypeId {
    /// Create a new event type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EventTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

/// An event with contextual data.
///
/// Events are built once and then handed to handlers by shared reference.
///
/// ## Event Data
///
/// - `event_type`: What kind of event this is
/// - `source`: The entity that caused the event (if any)
/// - `target`: The entity affected by the event (if any)
/// - `payload`: Named values (damage amount, spawn position, ...)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The type of event.
    pub event_type: EventTypeId,

    /// The entity that caused/initiated the event.
    pub source: Option<EntityId>,

    /// The entity that was affected by the event.
    pub target: Option<EntityId>,

    /// Named payload values. Games define the keys.
    pub payload: FxHashMap<String, PropertyValue>,
}

impl Event {
    /// Create a new event with just a type.
    pub fn new(event_type: EventTypeId) -> Self {
        Self {
            event_type,
            source: None,
            target: None,
            payload: FxHashMap::default(),
        }
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Add a payload value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Get a payload value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&PropertyValue> {
        self.payload.get(key)
    }

    /// Get an integer payload value, or a default.
    #[must_use]
    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(PropertyValue::as_int).unwrap_or(default)
    }

    /// Check if the payload has a key.
    #[must_use]
    pub fn has_value(&self, key: &str) -> bool {
        self.payload.contains_key(key)
    }

    /// Check if this event is of a given type.
    #[must_use]
    pub fn is(&self, event_type: EventTypeId) -> bool {
        self.event_type == event_type
    }
}

/// Builders for common event patterns.
impl Event {
    /// Create an event caused by one entity and affecting another.
    pub fn between(event_type: EventTypeId, source: EntityId, target: EntityId) -> Self {
        Self::new(event_type).with_source(source).with_target(target)
    }

    /// Create an event about a single entity.
    pub fn for_entity(event_type: EventTypeId, entity: EntityId) -> Self {
        Self::new(event_type).with_target(entity)
    }
}

/// Configuration for an event type.
///
/// Games provide this at startup to document event types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeConfig {
    /// Unique identifier for this event type.
    pub id: EventTypeId,

    /// Human-readable name (for debugging/display).
    pub name: String,

    /// Description of when this event fires.
    #[serde(default)]
    pub description: String,
}

impl EventTypeConfig {
    /// Create a new event type configuration.
    pub fn new(id: EventTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
        }
    }

    /// Add a description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_id() {
        let id = EventTypeId::new(5);
        assert_eq!(id.raw(), 5);
        assert_eq!(format!("{}", id), "EventType(5)");
    }

    #[test]
    fn test_event_builder() {
        let event = Event::new(EventTypeId::new(1))
            .with_source(EntityId(10))
            .with_target(EntityId(20))
            .with_value("damage", 5)
            .with_value("element", "fire");

        assert!(event.is(EventTypeId::new(1)));
        assert_eq!(event.source, Some(EntityId(10)));
        assert_eq!(event.target, Some(EntityId(20)));
        assert_eq!(event.int("damage", 0), 5);
        assert_eq!(event.int("missing", -1), -1);
        assert_eq!(event.value("element").and_then(PropertyValue::as_text), Some("fire"));
        assert!(event.has_value("element"));
        assert!(!event.has_value("other"));
    }

    #[test]
    fn test_between_event() {
        let event = Event::between(EventTypeId::new(2), EntityId(1), EntityId(2));
        assert_eq!(event.source, Some(EntityId(1)));
        assert_eq!(event.target, Some(EntityId(2)));
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_entity_event() {
        let event = Event::for_entity(EventTypeId::new(3), EntityId(15));
        assert_eq!(event.source, None);
        assert_eq!(event.target, Some(EntityId(15)));
    }

    #[test]
    fn test_event_config() {
        let config = EventTypeConfig::new(EventTypeId::new(1), "EnemySpawned")
            .with_description("Fired when an enemy enters the world");

        assert_eq!(config.id, EventTypeId::new(1));
        assert_eq!(config.name, "EnemySpawned");
        assert!(!config.description.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::between(EventTypeId::new(1), EntityId(10), EntityId(20))
            .with_value("damage", 5);
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }
}
