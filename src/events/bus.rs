//! The event bus.
//!
//! Synchronous publish/dispatch plus timed triggers. `fire` runs every
//! handler of the event's type before returning, in registration order. A
//! handler that fires another event recurses immediately; there is no
//! queue and no re-entrancy guard.
//!
//! ## Mutation during dispatch
//!
//! Handlers get `&mut EventBus`. Dispatch walks an O(1) snapshot of the
//! handler list and checks each registration is still live before calling
//! it, so:
//! - handlers subscribed during a dispatch first run on the next `fire`;
//! - handlers unsubscribed during a dispatch are skipped if they had not
//!   run yet.
//!
//! Trigger sweeps follow the same rule: `on_update` walks a snapshot of the
//! registry's ids and skips triggers removed mid-pass.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::core::{BusConfig, SimTime, TriggerClock};
use crate::error::{BusError, HandlerResult};
use crate::triggers::{EventTrigger, TriggerId, TriggerRegistry};

use super::event::{Event, EventTypeId};
use super::handler::{Handler, HandlerTable, Subscriber};

/// In-process event bus with timed triggers.
#[derive(Debug, Default)]
pub struct EventBus {
    handlers: HandlerTable,
    triggers: TriggerRegistry,
    clock: TriggerClock,
    config: BusConfig,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus with named event types.
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Bus configuration.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    // === Subscriptions ===

    /// Register a handler for an event type.
    pub fn subscribe(&mut self, event_type: EventTypeId, handler: Handler) -> Subscriber {
        let subscriber = self.handlers.insert(event_type, handler);
        debug!(
            event_type = %event_type,
            name = self.event_name(event_type),
            handler = %subscriber.id(),
            "handler subscribed"
        );
        subscriber
    }

    /// Register a closure for an event type.
    pub fn subscribe_fn<F>(&mut self, event_type: EventTypeId, handler: F) -> Subscriber
    where
        F: Fn(&mut EventBus, &Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(event_type, Arc::new(handler))
    }

    /// Remove a registration. No-op if it is already gone.
    pub fn unsubscribe(&mut self, subscriber: &Subscriber) -> bool {
        let removed = self.handlers.remove(subscriber);
        if removed {
            debug!(
                event_type = %subscriber.event_type(),
                handler = %subscriber.id(),
                "handler unsubscribed"
            );
        }
        removed
    }

    /// Remove one registration of this handler instance under `event_type`.
    ///
    /// When the same handler was registered several times for the type,
    /// the earliest registration goes. No-op if none is found.
    pub fn unsubscribe_handler(&mut self, event_type: EventTypeId, handler: &Handler) -> bool {
        self.handlers.remove_handler(event_type, handler)
    }

    /// Does this event type have any handler?
    #[must_use]
    pub fn has_handlers(&self, event_type: EventTypeId) -> bool {
        self.handlers.count(event_type) > 0
    }

    /// Number of handlers registered for an event type.
    #[must_use]
    pub fn handler_count(&self, event_type: EventTypeId) -> usize {
        self.handlers.count(event_type)
    }

    // === Dispatch ===

    /// Dispatch an event to every handler of its exact type.
    ///
    /// The first handler error stops the dispatch and is returned; handlers
    /// that already ran are not rolled back.
    pub fn fire(&mut self, event: &Event) -> Result<(), BusError> {
        let event_type = event.event_type;
        let snapshot = self.handlers.snapshot(event_type);
        if snapshot.is_empty() {
            trace!(event_type = %event_type, "no handlers");
            return Ok(());
        }

        trace!(
            event_type = %event_type,
            name = self.event_name(event_type),
            handlers = snapshot.len(),
            "firing event"
        );

        for registration in snapshot.iter() {
            if !self.handlers.contains(event_type, registration.id()) {
                continue;
            }
            (registration.handler())(self, event)
                .map_err(|source| BusError::handler(event_type, source))?;
        }
        Ok(())
    }

    // === Triggers ===

    /// Schedule a trigger.
    pub fn add_trigger(&mut self, trigger: EventTrigger) -> TriggerId {
        self.triggers.add(trigger)
    }

    /// Cancel a trigger. No-op if it already expired or was removed.
    pub fn remove_trigger(&mut self, id: TriggerId) -> bool {
        self.triggers.remove(id).is_some()
    }

    /// Is this trigger still scheduled?
    #[must_use]
    pub fn has_trigger(&self, id: TriggerId) -> bool {
        self.triggers.contains(id)
    }

    /// Look up a scheduled trigger.
    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&EventTrigger> {
        self.triggers.get(id)
    }

    /// Number of scheduled triggers.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Advance simulation time by `dt` and fire due triggers.
    ///
    /// Triggers are visited in the order they were added. Each due trigger
    /// fires its event through [`fire`](Self::fire) before the next trigger
    /// is advanced. Triggers added during this call start counting on the
    /// next one.
    ///
    /// A handler error ends the pass and is returned. Triggers not yet
    /// visited still receive `dt`; any that came due fire on the next call.
    pub fn on_update(&mut self, dt: Duration) -> Result<(), BusError> {
        self.clock.tick(dt);

        let ids = self.triggers.ids();
        for (index, &id) in ids.iter().enumerate() {
            let Some(event) = self.triggers.advance(id, dt) else {
                continue;
            };
            if let Err(err) = self.fire(&event) {
                for &rest in &ids[index + 1..] {
                    self.triggers.accrue(rest, dt);
                }
                debug!(
                    trigger = %id,
                    skipped = ids.len() - index - 1,
                    "trigger pass aborted by handler error"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// The bus clock.
    #[must_use]
    pub fn clock(&self) -> &TriggerClock {
        &self.clock
    }

    /// Drop all handlers and triggers and rewind the clock.
    pub fn clear(&mut self) {
        self.handlers.clear();
        self.triggers.clear();
        self.clock.reset();
    }

    fn event_name(&self, event_type: EventTypeId) -> &str {
        self.config.event_name(event_type).unwrap_or("")
    }
}
