//! Delayed telegram queue.
//!
//! A min-priority queue keyed by `(dispatch_time, sequence)`. The sequence
//! number is assigned on insertion, so telegrams due at the same instant
//! come out in the order they were queued. Identical input sequences
//! therefore replay identically.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SimTime;
use crate::error::BusError;

use super::telegram::Telegram;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Queued {
    time: SimTime,
    seq: u64,
    telegram: Telegram,
}

impl Queued {
    fn key(&self) -> (SimTime, u64) {
        (self.time, self.seq)
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Time-ordered queue of delayed telegrams.
#[derive(Clone, Debug, Default)]
pub struct TelegramQueue {
    heap: BinaryHeap<Reverse<Queued>>,
    next_seq: u64,
}

impl TelegramQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a telegram for `time`. Returns its sequence number.
    pub fn push(&mut self, time: SimTime, telegram: Telegram) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Queued { time, seq, telegram }));
        seq
    }

    /// Time of the earliest queued telegram.
    #[must_use]
    pub fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(q)| q.time)
    }

    /// Pop the earliest telegram if it is due at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<Telegram> {
        if self.next_time()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(q)| q.telegram)
    }

    /// Is there a queued telegram equal to `telegram` within `granularity`?
    #[must_use]
    pub fn contains_duplicate(&self, telegram: &Telegram, granularity: Duration) -> bool {
        if granularity.is_zero() {
            return false;
        }
        self.heap
            .iter()
            .any(|Reverse(q)| telegram.is_duplicate_of(&q.telegram, granularity))
    }

    /// Queued telegrams in delivery order.
    #[must_use]
    pub fn ordered(&self) -> Vec<&Telegram> {
        let mut entries: Vec<&Queued> = self.heap.iter().map(|Reverse(q)| q).collect();
        entries.sort();
        entries.into_iter().map(|q| &q.telegram).collect()
    }

    /// Number of queued telegrams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every queued telegram.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Capture the queue contents.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let mut entries: Vec<Queued> = self.heap.iter().map(|Reverse(q)| q.clone()).collect();
        entries.sort();
        QueueSnapshot {
            entries,
            next_seq: self.next_seq,
        }
    }

    /// Replace the queue contents with a snapshot.
    pub fn restore(&mut self, snapshot: QueueSnapshot) {
        self.next_seq = snapshot.next_seq;
        self.heap = snapshot.entries.into_iter().map(Reverse).collect();
    }
}

/// Serializable capture of a telegram queue, for save games and replays.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    entries: Vec<Queued>,
    next_seq: u64,
}

impl QueueSnapshot {
    /// Number of captured telegrams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captured telegrams with their dispatch times, in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = (SimTime, &Telegram)> {
        self.entries.iter().map(|q| (q.time, &q.telegram))
    }

    /// Encode with `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BusError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from `bincode` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BusError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::messaging::MessageType;

    fn telegram(n: u32) -> Telegram {
        Telegram::new(EntityId(0), EntityId(n), MessageType::new(n))
    }

    #[test]
    fn test_pop_due_in_time_order() {
        let mut queue = TelegramQueue::new();
        queue.push(SimTime::from_secs(3), telegram(3));
        queue.push(SimTime::from_secs(1), telegram(1));
        queue.push(SimTime::from_secs(2), telegram(2));

        assert_eq!(queue.next_time(), Some(SimTime::from_secs(1)));
        assert!(queue.pop_due(SimTime::ZERO).is_none());

        let due: Vec<_> = std::iter::from_fn(|| queue.pop_due(SimTime::from_secs(2)))
            .map(|t| t.message_type().raw())
            .collect();
        assert_eq!(due, vec![1, 2]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut queue = TelegramQueue::new();
        for n in [5, 1, 4] {
            queue.push(SimTime::from_secs(10), telegram(n));
        }

        let order: Vec<_> = queue.ordered().iter().map(|t| t.message_type().raw()).collect();
        assert_eq!(order, vec![5, 1, 4]);

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop_due(SimTime::from_secs(10)))
            .map(|t| t.message_type().raw())
            .collect();
        assert_eq!(popped, vec![5, 1, 4]);
    }

    #[test]
    fn test_contains_duplicate() {
        let mut queue = TelegramQueue::new();
        let original = telegram(1).scheduled_at(SimTime::from_millis(1000));
        queue.push(SimTime::from_millis(1000), original);

        let near = telegram(1).scheduled_at(SimTime::from_millis(1010));
        assert!(queue.contains_duplicate(&near, Duration::from_millis(50)));
        assert!(!queue.contains_duplicate(&near, Duration::ZERO));
        assert!(!queue.contains_duplicate(&telegram(2).scheduled_at(SimTime::from_millis(1000)), Duration::from_millis(50)));
    }

    #[test]
    fn test_snapshot_bytes_restore() {
        let mut queue = TelegramQueue::new();
        queue.push(SimTime::from_secs(2), telegram(2).with_extra_info("late"));
        queue.push(SimTime::from_secs(1), telegram(1));

        let bytes = queue.snapshot().to_bytes().unwrap();
        let snapshot = QueueSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot.len(), 2);
        let times: Vec<_> = snapshot.iter().map(|(time, _)| time).collect();
        assert_eq!(times, vec![SimTime::from_secs(1), SimTime::from_secs(2)]);

        let mut restored = TelegramQueue::new();
        restored.restore(snapshot);
        assert_eq!(restored.ordered(), queue.ordered());

        // Sequence numbering continues after restore
        assert_eq!(restored.push(SimTime::from_secs(1), telegram(9)), 2);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            QueueSnapshot::from_bytes(&[0xff, 0x01]),
            Err(BusError::Snapshot(_))
        ));
    }
}
