//! Entity events: generic events parametrized by entity properties.
//!
//! An entity can carry configuration for the events it takes part in under
//! a prefix, e.g. `"hit.damage" = 4` and `"hit.sound" = "thud"`. Firing a
//! generic hit event with prefix `"hit"` copies those into the payload as
//! `damage` and `sound`, so one event type serves every entity without
//! per-type code.

use crate::core::PropertyStore;
use crate::error::BusError;

use super::bus::EventBus;
use super::event::Event;

/// Copy the entity's `prefix.`-keyed properties into the event payload.
///
/// Keys are stored with `prefix.` stripped. Entity properties overwrite
/// payload values already present under the same key. A property named
/// exactly `prefix.` (empty suffix) is ignored.
#[must_use]
pub fn with_entity_properties(mut event: Event, prefix: &str, entity: &dyn PropertyStore) -> Event {
    let scope = format!("{prefix}.");

    for key in entity.property_keys() {
        let Some(suffix) = key.strip_prefix(&scope) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }
        if let Some(value) = entity.property(&key) {
            event.payload.insert(suffix.to_string(), value);
        }
    }
    event
}

impl EventBus {
    /// Fire an event after copying the entity's `prefix.` properties into
    /// its payload. See [`with_entity_properties`].
    pub fn fire_entity_event(
        &mut self,
        event: Event,
        prefix: &str,
        entity: &dyn PropertyStore,
    ) -> Result<(), BusError> {
        let event = with_entity_properties(event, prefix, entity);
        self.fire(&event)
    }
}
