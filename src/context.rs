//! Simulation context.
//!
//! Owns one [`EventBus`] and one [`MessageDispatcher`] and steps them
//! together. Hosts create a context per simulation (or per test) and hand
//! references to the systems that need them; nothing is global.

use std::time::Duration;

use tracing::trace;

use crate::core::{SimTime, SimulationConfig};
use crate::error::BusError;
use crate::events::EventBus;
use crate::messaging::MessageDispatcher;

/// An event bus and a message dispatcher sharing one clock.
///
/// The bus clock is authoritative: [`update`](Self::update) advances the
/// bus, then releases telegrams due at the bus's new time.
#[derive(Debug, Default)]
pub struct SimulationContext {
    bus: EventBus,
    dispatcher: MessageDispatcher,
}

impl SimulationContext {
    /// Create a context with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from configuration.
    pub fn from_config(config: SimulationConfig) -> Self {
        Self {
            bus: EventBus::with_config(config.bus),
            dispatcher: MessageDispatcher::with_config(config.dispatcher),
        }
    }

    /// The event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Mutable access to the event bus.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// The message dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// Mutable access to the message dispatcher.
    pub fn dispatcher_mut(&mut self) -> &mut MessageDispatcher {
        &mut self.dispatcher
    }

    /// Borrow the bus and the dispatcher at the same time.
    pub fn split_mut(&mut self) -> (&mut EventBus, &mut MessageDispatcher) {
        (&mut self.bus, &mut self.dispatcher)
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.bus.now()
    }

    /// Advance by `dt`: run due triggers, then deliver due telegrams.
    ///
    /// Returns the number of telegrams released. If a trigger's handler
    /// fails the error is returned and no telegrams are delivered this
    /// step; they go out on the next successful update.
    pub fn update(&mut self, dt: Duration) -> Result<usize, BusError> {
        self.bus.on_update(dt)?;
        let now = self.bus.now();
        let released = self.dispatcher.update(now);
        trace!(now = %now, released, "simulation step");
        Ok(released)
    }

    /// Drop handlers, triggers, listeners and queued telegrams, and rewind
    /// the clock. Configuration is kept.
    pub fn reset(&mut self) {
        let bus_config = self.bus.config().clone();
        let dispatcher_config = self.dispatcher.config().clone();
        self.bus = EventBus::with_config(bus_config);
        self.dispatcher = MessageDispatcher::with_config(dispatcher_config);
    }
}
