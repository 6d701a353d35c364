//! Telegrams: point-to-point timed messages between entities.
//!
//! A telegram names its sender and receiver by [`EntityId`] only. The
//! dispatcher never holds the entities themselves, so a telegram addressed
//! to an entity that has since been removed is just dropped on delivery.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PropertyValue, SimTime};

/// Message type identifier. Games define what message types exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageType(pub u32);

impl MessageType {
    /// Create a new message type.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message({})", self.0)
    }
}

/// Who a telegram is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    /// A single entity.
    Entity(EntityId),
    /// Every listener registered for the telegram's message type.
    Broadcast,
}

impl Recipient {
    /// The addressed entity, if this isn't a broadcast.
    #[must_use]
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Recipient::Entity(id) => Some(id),
            Recipient::Broadcast => None,
        }
    }
}

impl From<EntityId> for Recipient {
    fn from(id: EntityId) -> Self {
        Recipient::Entity(id)
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Entity(id) => write!(f, "{id}"),
            Recipient::Broadcast => f.write_str("Broadcast"),
        }
    }
}

/// Return receipt status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnReceipt {
    /// No receipt requested.
    #[default]
    Unneeded,
    /// The sender wants a receipt once the receiver has handled it.
    Needed,
    /// This telegram is the receipt.
    Sent,
}

/// A message between two entities.
///
/// Telegrams are immutable once built; the builder methods consume `self`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Telegram {
    sender: EntityId,
    receiver: Recipient,
    message_type: MessageType,
    extra_info: Option<PropertyValue>,
    dispatch_time: Option<SimTime>,
    return_receipt: ReturnReceipt,
}

impl Telegram {
    /// Create an immediate telegram.
    pub fn new(sender: EntityId, receiver: impl Into<Recipient>, message_type: MessageType) -> Self {
        Self {
            sender,
            receiver: receiver.into(),
            message_type,
            extra_info: None,
            dispatch_time: None,
            return_receipt: ReturnReceipt::Unneeded,
        }
    }

    /// Create a telegram for every listener of `message_type`.
    pub fn broadcast(sender: EntityId, message_type: MessageType) -> Self {
        Self::new(sender, Recipient::Broadcast, message_type)
    }

    /// Attach extra info (builder pattern).
    #[must_use]
    pub fn with_extra_info(mut self, extra_info: impl Into<PropertyValue>) -> Self {
        self.extra_info = Some(extra_info.into());
        self
    }

    /// Attach optional extra info (builder pattern).
    #[must_use]
    pub fn with_optional_extra_info(mut self, extra_info: Option<PropertyValue>) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Schedule for a point in time (builder pattern).
    #[must_use]
    pub fn scheduled_at(mut self, time: SimTime) -> Self {
        self.dispatch_time = Some(time);
        self
    }

    /// Ask for a return receipt (builder pattern).
    #[must_use]
    pub fn with_return_receipt(mut self) -> Self {
        self.return_receipt = ReturnReceipt::Needed;
        self
    }

    /// Sending entity.
    #[must_use]
    pub fn sender(&self) -> EntityId {
        self.sender
    }

    /// Receiving entity, or broadcast.
    #[must_use]
    pub fn receiver(&self) -> Recipient {
        self.receiver
    }

    /// Message type.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Extra info carried by the telegram.
    #[must_use]
    pub fn extra_info(&self) -> Option<&PropertyValue> {
        self.extra_info.as_ref()
    }

    /// When the telegram is due; `None` for immediate telegrams.
    #[must_use]
    pub fn dispatch_time(&self) -> Option<SimTime> {
        self.dispatch_time
    }

    /// Is this an immediate telegram?
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.dispatch_time.is_none()
    }

    /// Return receipt status.
    #[must_use]
    pub fn return_receipt(&self) -> ReturnReceipt {
        self.return_receipt
    }

    /// Build the receipt for this telegram, if one was requested.
    ///
    /// The receipt goes back to the sender with the same type and extra
    /// info, and never asks for a receipt itself. Broadcasts get none.
    #[must_use]
    pub fn receipt(&self) -> Option<Telegram> {
        if self.return_receipt != ReturnReceipt::Needed {
            return None;
        }
        let receiver = self.receiver.entity()?;

        Some(Telegram {
            sender: receiver,
            receiver: Recipient::Entity(self.sender),
            message_type: self.message_type,
            extra_info: self.extra_info.clone(),
            dispatch_time: None,
            return_receipt: ReturnReceipt::Sent,
        })
    }

    /// Same route, type and extra info, due within `granularity` of `other`.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Telegram, granularity: Duration) -> bool {
        if self.sender != other.sender
            || self.receiver != other.receiver
            || self.message_type != other.message_type
            || self.extra_info != other.extra_info
        {
            return false;
        }

        match (self.dispatch_time, other.dispatch_time) {
            (Some(a), Some(b)) => a.abs_diff(b) < granularity,
            _ => false,
        }
    }
}

impl std::fmt::Display for Telegram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.message_type, self.sender, self.receiver)?;
        if let Some(time) = self.dispatch_time {
            write!(f, " @ {time}")?;
        }
        Ok(())
    }
}
