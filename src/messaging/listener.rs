//! Telegram listeners.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;

use super::dispatcher::MessageDispatcher;
use super::telegram::{MessageType, Telegram};

/// Something that can receive telegrams.
///
/// The dispatcher that is delivering is passed in, so a listener can reply
/// or schedule follow-up telegrams. Return `true` if the telegram was
/// handled; unhandled telegrams are dropped.
pub trait Listener: Send + Sync {
    /// Handle a delivered telegram.
    fn handle_message(&self, dispatcher: &mut MessageDispatcher, telegram: &Telegram) -> bool;
}

impl<F> Listener for F
where
    F: Fn(&mut MessageDispatcher, &Telegram) -> bool + Send + Sync,
{
    fn handle_message(&self, dispatcher: &mut MessageDispatcher, telegram: &Telegram) -> bool {
        self(dispatcher, telegram)
    }
}

/// Shared handle to a listener.
pub type ListenerRef = Arc<dyn Listener>;

/// Where a listener is registered: a receiver, optionally narrowed to one
/// message type. `message_type: None` catches every type for the receiver
/// that has no more specific listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerKey {
    pub receiver: EntityId,
    pub message_type: Option<MessageType>,
}

impl ListenerKey {
    /// Listener for one message type.
    #[must_use]
    pub const fn typed(receiver: EntityId, message_type: MessageType) -> Self {
        Self {
            receiver,
            message_type: Some(message_type),
        }
    }

    /// Catch-all listener for a receiver.
    #[must_use]
    pub const fn any(receiver: EntityId) -> Self {
        Self {
            receiver,
            message_type: None,
        }
    }

    /// Does this registration accept the message type?
    #[must_use]
    pub fn accepts(&self, message_type: MessageType) -> bool {
        self.message_type.map_or(true, |t| t == message_type)
    }
}
