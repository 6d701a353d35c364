//! The message dispatcher.
//!
//! Creates, queues and delivers telegrams. Zero-delay telegrams are
//! delivered inside the dispatching call; delayed ones wait in a
//! [`TelegramQueue`] until [`update`](MessageDispatcher::update) is called
//! with a `now` at or past their dispatch time.
//!
//! Delivery is at-most-once and best effort: a telegram whose receiver has
//! no listener, or whose listener returns `false`, is dropped. Nothing is
//! ever re-queued.
//!
//! ## Listener routing
//!
//! At most one listener per `(receiver, message type)` pair. A catch-all
//! listener (`message_type: None`) handles every type the receiver has no
//! typed listener for. What happens on a second registration for the same
//! pair is set by [`DuplicateListenerPolicy`].

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::core::{DispatcherConfig, DuplicateListenerPolicy, EntityId, PropertyValue, SimTime};
use crate::error::BusError;

use super::listener::{Listener, ListenerKey, ListenerRef};
use super::queue::{QueueSnapshot, TelegramQueue};
use super::telegram::{MessageType, Recipient, Telegram};

/// What happened to a dispatched telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    /// Delivered immediately and handled.
    Delivered,
    /// Delivered immediately but nobody handled it.
    Dropped,
    /// Queued for later delivery.
    Queued,
    /// Discarded as a duplicate of an already queued telegram.
    Discarded,
}

#[derive(Clone)]
struct ListenerEntry {
    seq: u64,
    listener: ListenerRef,
}

/// Telegram dispatcher.
///
/// A plain value: create one per simulation (or per test) and pass it to
/// whoever needs it.
#[derive(Default)]
pub struct MessageDispatcher {
    queue: TelegramQueue,
    listeners: FxHashMap<ListenerKey, ListenerEntry>,
    next_listener_seq: u64,
    now: SimTime,
    config: DispatcherConfig,
}

impl MessageDispatcher {
    /// Create a dispatcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher with a configuration.
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Dispatcher configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// The latest `now` passed to [`update`](Self::update).
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    // === Listeners ===

    /// Register a listener for a receiver, optionally for one message type.
    pub fn add_listener(
        &mut self,
        receiver: EntityId,
        message_type: Option<MessageType>,
        listener: ListenerRef,
    ) -> Result<(), BusError> {
        let key = ListenerKey {
            receiver,
            message_type,
        };

        if self.listeners.contains_key(&key) {
            match self.config.duplicate_policy {
                DuplicateListenerPolicy::Reject => {
                    warn!(receiver = %receiver, message_type = ?message_type, "listener rejected");
                    return Err(BusError::ListenerConflict {
                        receiver,
                        message_type,
                    });
                }
                DuplicateListenerPolicy::Replace => {
                    debug!(receiver = %receiver, message_type = ?message_type, "listener replaced");
                }
            }
        }

        let seq = self.next_listener_seq;
        self.next_listener_seq += 1;
        self.listeners.insert(key, ListenerEntry { seq, listener });
        debug!(receiver = %receiver, message_type = ?message_type, "listener added");
        Ok(())
    }

    /// Register a closure as a listener.
    pub fn add_listener_fn<F>(
        &mut self,
        receiver: EntityId,
        message_type: Option<MessageType>,
        listener: F,
    ) -> Result<(), BusError>
    where
        F: Fn(&mut MessageDispatcher, &Telegram) -> bool + Send + Sync + 'static,
    {
        self.add_listener(receiver, message_type, Arc::new(listener))
    }

    /// Remove a listener. No-op if none is registered for the pair.
    pub fn remove_listener(&mut self, receiver: EntityId, message_type: Option<MessageType>) -> bool {
        self.listeners
            .remove(&ListenerKey {
                receiver,
                message_type,
            })
            .is_some()
    }

    /// Remove every listener of a receiver (e.g. the entity left the world).
    pub fn remove_listeners_for(&mut self, receiver: EntityId) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|key, _| key.receiver != receiver);
        before - self.listeners.len()
    }

    /// Is a listener registered for exactly this pair?
    #[must_use]
    pub fn has_listener(&self, receiver: EntityId, message_type: Option<MessageType>) -> bool {
        self.listeners.contains_key(&ListenerKey {
            receiver,
            message_type,
        })
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    // === Dispatch ===

    /// Send a telegram from `sender` to `receiver`.
    ///
    /// A zero delay delivers before returning. Otherwise the telegram is
    /// queued for `now + delay`.
    pub fn dispatch_message(
        &mut self,
        delay: Duration,
        sender: EntityId,
        receiver: EntityId,
        message_type: MessageType,
        extra_info: Option<PropertyValue>,
    ) -> DispatchOutcome {
        let telegram =
            Telegram::new(sender, receiver, message_type).with_optional_extra_info(extra_info);
        self.dispatch(delay, telegram)
    }

    /// Like [`dispatch_message`](Self::dispatch_message), and once the
    /// receiver has handled it a receipt is delivered back to `sender`.
    pub fn dispatch_with_receipt(
        &mut self,
        delay: Duration,
        sender: EntityId,
        receiver: EntityId,
        message_type: MessageType,
        extra_info: Option<PropertyValue>,
    ) -> DispatchOutcome {
        let telegram = Telegram::new(sender, receiver, message_type)
            .with_optional_extra_info(extra_info)
            .with_return_receipt();
        self.dispatch(delay, telegram)
    }

    /// Send a telegram to every receiver listening for `message_type`.
    ///
    /// Each receiver gets it once, through the same listener a direct
    /// telegram would reach.
    pub fn dispatch_broadcast(
        &mut self,
        delay: Duration,
        sender: EntityId,
        message_type: MessageType,
        extra_info: Option<PropertyValue>,
    ) -> DispatchOutcome {
        let telegram =
            Telegram::broadcast(sender, message_type).with_optional_extra_info(extra_info);
        self.dispatch(delay, telegram)
    }

    /// Dispatch a prepared telegram after `delay`.
    ///
    /// Any dispatch time already set on the telegram is replaced.
    pub fn dispatch(&mut self, delay: Duration, telegram: Telegram) -> DispatchOutcome {
        if delay.is_zero() {
            return if self.deliver(&telegram) {
                DispatchOutcome::Delivered
            } else {
                DispatchOutcome::Dropped
            };
        }

        let time = self.now + delay;
        let telegram = telegram.scheduled_at(time);

        if self
            .queue
            .contains_duplicate(&telegram, self.config.time_granularity)
        {
            debug!(telegram = %telegram, "duplicate telegram discarded");
            return DispatchOutcome::Discarded;
        }

        debug!(telegram = %telegram, "telegram queued");
        self.queue.push(time, telegram);
        DispatchOutcome::Queued
    }

    /// Deliver every queued telegram due at or before `now`.
    ///
    /// Telegrams come out in dispatch-time order, ties in the order they
    /// were queued. Returns how many were released.
    pub fn update(&mut self, now: SimTime) -> usize {
        self.now = self.now.max(now);

        let mut released = 0;
        while let Some(telegram) = self.queue.pop_due(self.now) {
            self.deliver(&telegram);
            released += 1;
        }
        released
    }

    /// Hand a telegram to its listener(s) now. Returns whether it was
    /// handled.
    pub fn deliver(&mut self, telegram: &Telegram) -> bool {
        match telegram.receiver() {
            Recipient::Entity(receiver) => self.deliver_to(receiver, telegram),
            Recipient::Broadcast => self.deliver_broadcast(telegram),
        }
    }

    fn deliver_to(&mut self, receiver: EntityId, telegram: &Telegram) -> bool {
        let Some(listener) = self.route(receiver, telegram.message_type()) else {
            debug!(telegram = %telegram, "no listener, telegram dropped");
            return false;
        };

        trace!(telegram = %telegram, "delivering");
        let handled = listener.handle_message(self, telegram);
        if !handled {
            debug!(telegram = %telegram, "telegram not handled, dropped");
            return false;
        }

        if let Some(receipt) = telegram.receipt() {
            debug!(telegram = %receipt, "return receipt");
            self.deliver(&receipt);
        }
        true
    }

    /// One listener per receiver, chosen like [`route`](Self::route), in
    /// registration order of the chosen listeners.
    fn deliver_broadcast(&mut self, telegram: &Telegram) -> bool {
        let message_type = telegram.message_type();

        let mut chosen: FxHashMap<EntityId, (ListenerKey, u64, ListenerRef)> = FxHashMap::default();
        for (key, entry) in &self.listeners {
            if !key.accepts(message_type) {
                continue;
            }
            // A typed listener displaces the receiver's catch-all, never the reverse
            let keep_current = chosen
                .get(&key.receiver)
                .is_some_and(|(current, _, _)| current.message_type.is_some() || key.message_type.is_none());
            if !keep_current {
                chosen.insert(key.receiver, (*key, entry.seq, entry.listener.clone()));
            }
        }

        let mut targets: SmallVec<[(ListenerKey, u64, ListenerRef); 8]> =
            chosen.into_values().collect();
        targets.sort_by_key(|(_, seq, _)| *seq);

        trace!(telegram = %telegram, listeners = targets.len(), "broadcasting");

        let mut handled = false;
        for (key, seq, listener) in targets {
            // Skip listeners removed or replaced by an earlier one
            if self.listeners.get(&key).map(|e| e.seq) != Some(seq) {
                continue;
            }
            handled |= listener.handle_message(self, telegram);
        }
        handled
    }

    /// Typed listener first, then the receiver's catch-all.
    fn route(&self, receiver: EntityId, message_type: MessageType) -> Option<ListenerRef> {
        self.listeners
            .get(&ListenerKey::typed(receiver, message_type))
            .or_else(|| self.listeners.get(&ListenerKey::any(receiver)))
            .map(|entry| entry.listener.clone())
    }

    // === Queue ===

    /// Number of queued telegrams.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Visit queued telegrams in delivery order.
    pub fn scan_queue(&self, mut visitor: impl FnMut(&Telegram)) {
        for telegram in self.queue.ordered() {
            visitor(telegram);
        }
    }

    /// Drop every queued telegram.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Capture the queued telegrams.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    /// Replace the queued telegrams with a snapshot.
    pub fn restore(&mut self, snapshot: QueueSnapshot) {
        self.queue.restore(snapshot);
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const GREET: MessageType = MessageType::new(1);
    const FLEE: MessageType = MessageType::new(2);

    fn inbox() -> (Arc<Mutex<Vec<Telegram>>>, ListenerRef) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let listener: ListenerRef = Arc::new(move |_: &mut MessageDispatcher, t: &Telegram| {
            sink.lock().unwrap().push(t.clone());
            true
        });
        (log, listener)
    }

    #[test]
    fn test_immediate_delivery() {
        let mut dispatcher = MessageDispatcher::new();
        let (log, listener) = inbox();
        dispatcher.add_listener(EntityId(2), Some(GREET), listener).unwrap();

        let outcome = dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);

        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_no_listener_drops() {
        let mut dispatcher = MessageDispatcher::new();
        let outcome = dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);
        assert_eq!(outcome, DispatchOutcome::Dropped);
    }

    #[test]
    fn test_unhandled_drops() {
        let mut dispatcher = MessageDispatcher::new();
        dispatcher
            .add_listener_fn(EntityId(2), None, |_, _| false)
            .unwrap();
        let outcome = dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);
        assert_eq!(outcome, DispatchOutcome::Dropped);
    }

    #[test]
    fn test_typed_listener_before_catch_all() {
        let mut dispatcher = MessageDispatcher::new();
        let (typed_log, typed) = inbox();
        let (any_log, any) = inbox();
        dispatcher.add_listener(EntityId(2), Some(GREET), typed).unwrap();
        dispatcher.add_listener(EntityId(2), None, any).unwrap();

        dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);
        dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), FLEE, None);

        assert_eq!(typed_log.lock().unwrap().len(), 1);
        let any_seen = any_log.lock().unwrap();
        assert_eq!(any_seen.len(), 1);
        assert_eq!(any_seen[0].message_type(), FLEE);
    }

    #[test]
    fn test_duplicate_listener_rejected() {
        let mut dispatcher = MessageDispatcher::new();
        let (first_log, first) = inbox();
        let (_, second) = inbox();

        dispatcher.add_listener(EntityId(2), Some(GREET), first).unwrap();
        let err = dispatcher
            .add_listener(EntityId(2), Some(GREET), second)
            .unwrap_err();
        assert!(matches!(err, BusError::ListenerConflict { receiver: EntityId(2), .. }));

        dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);
        assert_eq!(first_log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_listener_replaced() {
        let mut dispatcher =
            MessageDispatcher::with_config(DispatcherConfig::new().replace_duplicates());
        let (first_log, first) = inbox();
        let (second_log, second) = inbox();

        dispatcher.add_listener(EntityId(2), Some(GREET), first).unwrap();
        dispatcher.add_listener(EntityId(2), Some(GREET), second).unwrap();
        assert_eq!(dispatcher.listener_count(), 1);

        dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);
        assert!(first_log.lock().unwrap().is_empty());
        assert_eq!(second_log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_delayed_delivery() {
        let mut dispatcher = MessageDispatcher::new();
        let (log, listener) = inbox();
        dispatcher.add_listener(EntityId(2), Some(GREET), listener).unwrap();

        let outcome = dispatcher.dispatch_message(
            Duration::from_secs(10),
            EntityId(1),
            EntityId(2),
            GREET,
            Some("hello".into()),
        );
        assert_eq!(outcome, DispatchOutcome::Queued);

        assert_eq!(dispatcher.update(SimTime::from_secs(5)), 0);
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(dispatcher.update(SimTime::from_secs(10)), 1);
        let seen = log.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dispatch_time(), Some(SimTime::from_secs(10)));
        assert_eq!(seen[0].extra_info().and_then(PropertyValue::as_text), Some("hello"));
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.update(SimTime::from_secs(100));
        dispatcher.dispatch_message(Duration::from_secs(1), EntityId(1), EntityId(2), GREET, None);

        let mut times = Vec::new();
        dispatcher.scan_queue(|t| times.push(t.dispatch_time()));
        assert_eq!(times, vec![Some(SimTime::from_secs(101))]);
    }

    #[test]
    fn test_now_never_goes_back() {
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.update(SimTime::from_secs(10));
        dispatcher.update(SimTime::from_secs(4));
        assert_eq!(dispatcher.now(), SimTime::from_secs(10));
    }

    #[test]
    fn test_time_granularity_discards_duplicates() {
        let mut dispatcher = MessageDispatcher::with_config(
            DispatcherConfig::new().with_time_granularity(Duration::from_millis(100)),
        );

        let first = dispatcher.dispatch_message(Duration::from_secs(1), EntityId(1), EntityId(2), GREET, None);
        let again = dispatcher.dispatch_message(Duration::from_secs(1), EntityId(1), EntityId(2), GREET, None);
        let other = dispatcher.dispatch_message(Duration::from_secs(1), EntityId(1), EntityId(2), FLEE, None);

        assert_eq!(first, DispatchOutcome::Queued);
        assert_eq!(again, DispatchOutcome::Discarded);
        assert_eq!(other, DispatchOutcome::Queued);
        assert_eq!(dispatcher.pending_count(), 2);
    }

    #[test]
    fn test_listener_can_reply() {
        let mut dispatcher = MessageDispatcher::new();
        let (log, inbox_1) = inbox();

        dispatcher
            .add_listener_fn(EntityId(2), Some(GREET), |dispatcher, t| {
                dispatcher.dispatch_message(Duration::ZERO, EntityId(2), t.sender(), FLEE, None);
                true
            })
            .unwrap();
        dispatcher.add_listener(EntityId(1), Some(FLEE), inbox_1).unwrap();

        dispatcher.dispatch_message(Duration::ZERO, EntityId(1), EntityId(2), GREET, None);

        let seen = log.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].sender(), EntityId(2));
    }

    #[test]
    fn test_broadcast_once_per_receiver() {
        let mut dispatcher = MessageDispatcher::new();
        let (typed_log, typed) = inbox();
        let (any_log, any) = inbox();
        let (other_log, other) = inbox();
        dispatcher.add_listener(EntityId(2), None, any).unwrap();
        dispatcher.add_listener(EntityId(2), Some(GREET), typed).unwrap();
        dispatcher.add_listener(EntityId(3), None, other).unwrap();

        dispatcher.dispatch_broadcast(Duration::ZERO, EntityId(1), GREET, None);
        assert_eq!(typed_log.lock().unwrap().len(), 1);
        assert!(any_log.lock().unwrap().is_empty());
        assert_eq!(other_log.lock().unwrap().len(), 1);

        // No typed listener for FLEE, so the catch-all takes it
        dispatcher.dispatch_broadcast(Duration::ZERO, EntityId(1), FLEE, None);
        assert_eq!(typed_log.lock().unwrap().len(), 1);
        assert_eq!(any_log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_listeners_for() {
        let mut dispatcher = MessageDispatcher::new();
        let (_, a) = inbox();
        let (_, b) = inbox();
        let (_, c) = inbox();
        dispatcher.add_listener(EntityId(2), Some(GREET), a).unwrap();
        dispatcher.add_listener(EntityId(2), None, b).unwrap();
        dispatcher.add_listener(EntityId(3), None, c).unwrap();

        assert_eq!(dispatcher.remove_listeners_for(EntityId(2)), 2);
        assert!(!dispatcher.has_listener(EntityId(2), None));
        assert!(dispatcher.has_listener(EntityId(3), None));

        assert!(!dispatcher.remove_listener(EntityId(2), Some(GREET)));
        assert!(dispatcher.remove_listener(EntityId(3), None));
    }

    #[test]
    fn test_clear_queue_and_listeners() {
        let mut dispatcher = MessageDispatcher::new();
        let (_, listener) = inbox();
        dispatcher.add_listener(EntityId(2), None, listener).unwrap();
        dispatcher.dispatch_message(Duration::from_secs(1), EntityId(1), EntityId(2), GREET, None);

        dispatcher.clear_queue();
        dispatcher.clear_listeners();
        assert_eq!(dispatcher.pending_count(), 0);
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
