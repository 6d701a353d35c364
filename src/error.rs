//! Error types.
//!
//! Two layers:
//! - [`ConfigError`]: malformed trigger configuration, reported when the
//!   trigger is built, never when it fires.
//! - [`BusError`]: everything the bus or dispatcher reports to its caller.
//!
//! Removing a registration that does not exist is never an error.

use thiserror::Error;

use crate::core::EntityId;
use crate::events::EventTypeId;
use crate::messaging::MessageType;

/// Boxed error returned by a failing handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by event handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Invalid trigger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A delayed trigger needs a non-zero delay.
    #[error("trigger delay must be greater than zero")]
    ZeroDelay,

    /// A limited trigger must be allowed to fire at least once.
    #[error("trigger limit must be at least 1")]
    ZeroLimit,
}

/// Errors reported by [`EventBus`](crate::events::EventBus) and
/// [`MessageDispatcher`](crate::messaging::MessageDispatcher).
#[derive(Debug, Error)]
pub enum BusError {
    /// A handler failed while an event was being dispatched.
    ///
    /// Handlers registered before the failing one have already run;
    /// the remaining handlers of that dispatch were skipped.
    #[error("handler for {event_type} failed: {source}")]
    Handler {
        event_type: EventTypeId,
        #[source]
        source: HandlerError,
    },

    /// A listener is already registered for this receiver and message type.
    #[error("listener already registered for {receiver} ({})", describe_filter(.message_type))]
    ListenerConflict {
        receiver: EntityId,
        message_type: Option<MessageType>,
    },

    /// Trigger configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A queue snapshot could not be encoded or decoded.
    #[error("queue snapshot: {0}")]
    Snapshot(#[from] bincode::Error),
}

fn describe_filter(message_type: &Option<MessageType>) -> String {
    match message_type {
        Some(t) => t.to_string(),
        None => "any message".to_string(),
    }
}

impl BusError {
    /// Wrap a handler failure for the given event type.
    pub fn handler(event_type: EventTypeId, source: HandlerError) -> Self {
        Self::Handler { event_type, source }
    }

    /// The event type whose dispatch failed, if this is a handler error.
    #[must_use]
    pub fn event_type(&self) -> Option<EventTypeId> {
        match self {
            Self::Handler { event_type, .. } => Some(*event_type),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroDelay.to_string(),
            "trigger delay must be greater than zero"
        );
        assert_eq!(ConfigError::ZeroLimit.to_string(), "trigger limit must be at least 1");
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = BusError::handler(EventTypeId::new(7), "boom".into());

        assert_eq!(err.event_type(), Some(EventTypeId::new(7)));
        assert_eq!(err.to_string(), "handler for EventType(7) failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_listener_conflict_display() {
        let err = BusError::ListenerConflict {
            receiver: EntityId(3),
            message_type: Some(MessageType::new(2)),
        };
        assert_eq!(err.to_string(), "listener already registered for Entity(3) (Message(2))");

        let err = BusError::ListenerConflict {
            receiver: EntityId(3),
            message_type: None,
        };
        assert_eq!(err.to_string(), "listener already registered for Entity(3) (any message)");
        assert_eq!(err.event_type(), None);
    }

    #[test]
    fn test_config_error_converts() {
        let err: BusError = ConfigError::ZeroLimit.into();
        assert!(matches!(err, BusError::Config(ConfigError::ZeroLimit)));
        assert_eq!(err.to_string(), "trigger limit must be at least 1");
    }
}
