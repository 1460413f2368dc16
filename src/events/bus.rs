use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use uuid::Uuid;

use super::types::{Event, EventMetadata};

/// A subscriber's handle onto the event stream.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    receiver: Receiver<(Event, EventMetadata)>,
}

impl Subscription {
    /// Returns the subscription ID (used to unsubscribe).
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Blocks until the next event arrives; None once the bus is gone.
    pub fn receive(&self) -> Option<(Event, EventMetadata)> {
        self.receiver.recv().ok()
    }

    /// Receives the next event without blocking.
    pub fn try_receive(&self) -> Option<(Event, EventMetadata)> {
        self.receiver.try_recv().ok()
    }
}

/// Fans events out to subscribers over per-subscriber unbounded channels.
///
/// `publish` never blocks: it stamps metadata and `try_send`s to every
/// subscriber, so it is safe to call from within a book's critical section
/// without coupling subscriber latency to the matching path. Subscribers
/// drain their channels on their own threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<Uuid, Sender<(Event, EventMetadata)>>>>,
    sequence: Arc<AtomicU64>,
    source: String,
}

impl EventBus {
    /// Creates a new event bus tagged with a source identifier.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(1)),
            source: source.into(),
        }
    }

    /// Registers a new subscriber and returns its channel handle.
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = unbounded();
        self.subscribers.write().insert(id, sender);
        Subscription { id, receiver }
    }

    /// Removes a subscriber; returns false if it was not registered.
    pub fn unsubscribe(&self, subscription_id: Uuid) -> bool {
        self.subscribers.write().remove(&subscription_id).is_some()
    }

    /// Publishes one event to every subscriber.
    pub fn publish(&self, event: Event) {
        let metadata = EventMetadata {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            source: self.source.clone(),
        };

        // Collect the senders first so slow subscribers never hold the map
        // lock open.
        let senders: Vec<_> = self.subscribers.read().values().cloned().collect();
        for sender in senders {
            let _ = sender.try_send((event.clone(), metadata.clone()));
        }
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
