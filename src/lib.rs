//! # rust-gamebus
//!
//! Decoupled communication for game simulations.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: Event types and message types are opaque numeric
//!    ids. Games decide what exists and what the payloads mean.
//!
//! 2. **Synchronous and Deterministic**: Everything runs on the caller's
//!    thread. Handlers run in registration order, triggers in insertion
//!    order, and delayed telegrams in (dispatch time, queue order).
//!
//! 3. **No Globals**: The bus and the dispatcher are plain values, bundled
//!    by [`SimulationContext`] and passed to whoever needs them.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, simulation time, properties, configuration
//! - `events`: Event bus with immediate dispatch
//! - `triggers`: Timed triggers that fire events on the bus
//! - `messaging`: Telegrams and the delayed message dispatcher
//! - `context`: Bus and dispatcher stepped together
//! - `error`: Error types

pub mod core;
pub mod error;
pub mod events;
pub mod triggers;
pub mod messaging;
pub mod context;

// Re-export commonly used types
pub use crate::core::{
    EntityId, SimTime, TriggerClock,
    PropertyMap, PropertyStore, PropertyValue,
    BusConfig, DispatcherConfig, DuplicateListenerPolicy, SimulationConfig,
};

pub use crate::error::{BusError, ConfigError, HandlerError, HandlerResult};

pub use crate::events::{
    Event, EventBus, EventTypeConfig, EventTypeId,
    Handler, HandlerId, Subscriber,
    with_entity_properties,
};

pub use crate::triggers::{
    EventTrigger, TriggerId, TriggerLimit, TriggerRegistry, TriggerState,
};

pub use crate::messaging::{
    DispatchOutcome, Listener, ListenerKey, ListenerRef, MessageDispatcher,
    MessageType, QueueSnapshot, Recipient, ReturnReceipt, Telegram,
};

pub use crate::context::SimulationContext;
