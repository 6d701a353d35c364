//! Event bus: typed events, handlers, synchronous dispatch.
//!
//! Subsystems talk to each other through events instead of direct
//! references. The bus is game-agnostic: games define their own event types
//! and decide when to fire them.
//!
//! ## Key Components
//!
//! - [`EventTypeId`]: Opaque identifier for event types (game-defined)
//! - [`Event`]: An event with source, target and payload
//! - [`HandlerTable`]: Event type → handlers, in registration order
//! - [`EventBus`]: Subscriptions, immediate dispatch, timed triggers
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use rust_gamebus::core::EntityId;
//! use rust_gamebus::events::{Event, EventBus, EventTypeId};
//!
//! const ENEMY_KILLED: EventTypeId = EventTypeId::new(1);
//!
//! let mut bus = EventBus::new();
//! let score = Arc::new(Mutex::new(0));
//!
//! let counter = score.clone();
//! let subscriber = bus.subscribe_fn(ENEMY_KILLED, move |_bus, event| {
//!     *counter.lock().unwrap() += event.int("points", 0);
//!     Ok(())
//! });
//!
//! bus.fire(&Event::for_entity(ENEMY_KILLED, EntityId(12)).with_value("points", 50))
//!     .unwrap();
//! assert_eq!(*score.lock().unwrap(), 50);
//!
//! bus.unsubscribe(&subscriber);
//! assert!(!bus.has_handlers(ENEMY_KILLED));
//! ```

mod bus;
mod entity;
mod event;
mod handler;

pub use bus::EventBus;
pub use entity::with_entity_properties;
pub use event::{Event, EventTypeConfig, EventTypeId};
pub use handler::{Handler, HandlerId, HandlerTable, Registration, Subscriber};
