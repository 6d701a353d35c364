//! Core types: entity identifiers, simulation time, properties, configuration.
//!
//! These are leaf building blocks shared by the event bus, the trigger
//! system and the message dispatcher.

pub mod entity;
pub mod time;
pub mod properties;
pub mod config;

pub use entity::EntityId;
pub use time::{SimTime, TriggerClock};
pub use properties::{PropertyMap, PropertyStore, PropertyValue};
pub use config::{BusConfig, DispatcherConfig, DuplicateListenerPolicy, SimulationConfig};
