//! Timed event triggers.
//!
//! Triggers schedule future events against simulation time. The bus owns a
//! [`TriggerRegistry`] and advances it on every
//! [`on_update`](crate::events::EventBus::on_update); due triggers build
//! their event and the bus fires it like any other.
//!
//! ## Key Components
//!
//! - [`EventTrigger`]: Countdown state plus an event factory
//! - [`TriggerLimit`]: Fire N times or forever
//! - [`TriggerRegistry`]: Active triggers, advanced in insertion order
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use rust_gamebus::events::{Event, EventBus, EventTypeId};
//! use rust_gamebus::triggers::EventTrigger;
//!
//! const SPAWN_WAVE: EventTypeId = EventTypeId::new(1);
//!
//! let mut bus = EventBus::new();
//!
//! // "Spawn a wave every 30 seconds, three times"
//! let waves = EventTrigger::repeating(|| Event::new(SPAWN_WAVE), Duration::from_secs(30), 3)
//!     .unwrap();
//! let id = bus.add_trigger(waves);
//!
//! bus.on_update(Duration::from_secs(30)).unwrap();
//! assert!(bus.has_trigger(id));
//! ```

mod registry;
mod trigger;

pub use registry::{TriggerId, TriggerIds, TriggerRegistry};
pub use trigger::{EventFactory, EventTrigger, TriggerLimit, TriggerState};
