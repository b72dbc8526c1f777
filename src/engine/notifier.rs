//! Fan-out of lifecycle events to subscribers.
//!
//! Each subscriber owns the receiving half of an unbounded channel, so
//! publishing never blocks the engine. Subscribers whose receiver was
//! dropped are pruned on the next publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use parking_lot::Mutex;

use crate::types::AllocationEvent;

#[derive(Debug, Default)]
pub struct EventNotifier {
    subscribers: Mutex<Vec<Sender<AllocationEvent>>>,

    /// Last assigned sequence number
    sequence: AtomicU64,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; it sees every event published from now on
    pub fn subscribe(&self) -> Receiver<AllocationEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Stamp `event` with the next sequence number and deliver it.
    ///
    /// Sequence assignment and delivery happen under one lock, so every
    /// subscriber observes events in sequence order.
    pub fn publish(&self, mut event: AllocationEvent) -> u64 {
        let mut subscribers = self.subscribers.lock();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        event.sequence = sequence;

        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        sequence
    }

    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
