//! Telegram messaging between entities.
//!
//! Point-to-point messages with optional delivery delay. Senders and
//! receivers only know each other's [`EntityId`](crate::core::EntityId),
//! so AI, entities and UI can talk without holding references.
//!
//! ## Key Components
//!
//! - [`Telegram`]: Sender, receiver, message type, extra info, dispatch time
//! - [`Listener`]: Receives telegrams; closures implement it
//! - [`TelegramQueue`]: Delayed telegrams ordered by (time, insertion)
//! - [`MessageDispatcher`]: Routing, immediate and delayed delivery
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use rust_gamebus::core::{EntityId, SimTime};
//! use rust_gamebus::messaging::{DispatchOutcome, MessageDispatcher, MessageType};
//!
//! const ALERT: MessageType = MessageType::new(1);
//! let guard = EntityId(1);
//! let captain = EntityId(2);
//!
//! let mut dispatcher = MessageDispatcher::new();
//! dispatcher
//!     .add_listener_fn(captain, Some(ALERT), |_dispatcher, telegram| {
//!         telegram.sender() == EntityId(1)
//!     })
//!     .unwrap();
//!
//! // Reaches the captain three seconds from now
//! let outcome = dispatcher.dispatch_message(Duration::from_secs(3), guard, captain, ALERT, None);
//! assert_eq!(outcome, DispatchOutcome::Queued);
//!
//! assert_eq!(dispatcher.update(SimTime::from_secs(2)), 0);
//! assert_eq!(dispatcher.update(SimTime::from_secs(3)), 1);
//! ```

mod dispatcher;
mod listener;
mod queue;
mod telegram;

pub use dispatcher::{DispatchOutcome, MessageDispatcher};
pub use listener::{Listener, ListenerKey, ListenerRef};
pub use queue::{QueueSnapshot, TelegramQueue};
pub use telegram::{MessageType, Recipient, ReturnReceipt, Telegram};
