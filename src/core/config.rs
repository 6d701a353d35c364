//! Configuration types.
//!
//! Hosts configure the core at startup by providing:
//! - `BusConfig`: Names for event types (used in logs and diagnostics)
//! - `DispatcherConfig`: Telegram queue and listener registration policy
//! - `SimulationConfig`: Combines both for a [`SimulationContext`](crate::context::SimulationContext)
//!
//! All configs derive `serde` so they can be loaded from JSON or TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::{EventTypeConfig, EventTypeId};

/// Event bus configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Known event types.
    #[serde(default)]
    pub event_types: Vec<EventTypeConfig>,
}

impl BusConfig {
    /// Create an empty bus configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event type configuration.
    #[must_use]
    pub fn with_event_type(mut self, event_type: EventTypeConfig) -> Self {
        self.event_types.push(event_type);
        self
    }

    /// Get an event type config by ID.
    #[must_use]
    pub fn get_event_type(&self, id: EventTypeId) -> Option<&EventTypeConfig> {
        self.event_types.iter().find(|t| t.id == id)
    }

    /// Human-readable name for an event type, if configured.
    #[must_use]
    pub fn event_name(&self, id: EventTypeId) -> Option<&str> {
        self.get_event_type(id).map(|t| t.name.as_str())
    }
}

/// What to do when a second listener is registered for the same
/// receiver and message type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateListenerPolicy {
    /// Keep the existing listener and return
    /// [`BusError::ListenerConflict`](crate::error::BusError::ListenerConflict).
    #[default]
    Reject,
    /// Replace the existing listener.
    Replace,
}

/// Message dispatcher configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Delayed telegrams identical to one already queued within this window
    /// are discarded. Zero disables the check.
    #[serde(default)]
    pub time_granularity: Duration,

    /// Policy for duplicate `(receiver, message type)` registrations.
    #[serde(default)]
    pub duplicate_policy: DuplicateListenerPolicy,
}

impl DispatcherConfig {
    /// Create the default dispatcher configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate telegram window.
    #[must_use]
    pub fn with_time_granularity(mut self, granularity: Duration) -> Self {
        self.time_granularity = granularity;
        self
    }

    /// Replace existing listeners instead of rejecting duplicates.
    #[must_use]
    pub fn replace_duplicates(mut self) -> Self {
        self.duplicate_policy = DuplicateListenerPolicy::Replace;
        self
    }
}

/// Complete configuration for a simulation context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Event bus configuration.
    #[serde(default)]
    pub bus: BusConfig,

    /// Message dispatcher configuration.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

impl SimulationConfig {
    /// Create the default simulation configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bus configuration.
    #[must_use]
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Set the dispatcher configuration.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}
