use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::model::FlowEvent;

/// Per-subscriber queue capacity. A full queue drops the event for that
/// subscriber rather than blocking the producer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

struct Subscriber {
    id: u64,
    session_id: String,
    connection_id: Option<String>,
    sender: mpsc::Sender<FlowEvent>,
}

/// Many-to-many router: dispatches events produced inside a flow to HTTP
/// streaming subscribers, addressed either per-session or per-connection.
///
/// Adding/removing a subscriber takes a short write lock; `emit` takes a
/// read lock and enqueues without awaiting, so a slow or wedged consumer
/// never blocks a producer.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

pub struct SubscriberHandle {
    pub id: u64,
    pub receiver: mpsc::Receiver<FlowEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its id plus the receiving
    /// end of its queue. The id is used later to unsubscribe.
    pub fn add_subscriber(&self, session_id: String, connection_id: Option<String>) -> SubscriberHandle {
        self.add_subscriber_with_capacity(session_id, connection_id, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn add_subscriber_with_capacity(
        &self,
        session_id: String,
        connection_id: Option<String>,
        capacity: usize,
    ) -> SubscriberHandle {
        let (sender, receiver) = mpsc::channel(capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push(Subscriber {
            id,
            session_id,
            connection_id,
            sender,
        });
        SubscriberHandle { id, receiver }
    }

    /// Drops the subscriber's sender so no further events are enqueued
    /// for it. Events already buffered in its queue remain available to
    /// drain from the `Receiver` the caller is holding.
    pub fn remove_subscriber(&self, id: u64) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Enqueues `event` to every matching subscriber. When
    /// `target_connection_id` is set, only the subscriber with that
    /// connection id receives it; otherwise every subscriber for the
    /// event's session receives it. Never blocks: a full or closed queue
    /// is logged and the event is dropped for that subscriber only.
    pub fn emit(&self, event: FlowEvent, target_connection_id: Option<&str>) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            let matches = match target_connection_id {
                Some(cid) => subscriber.connection_id.as_deref() == Some(cid),
                None => subscriber.session_id == event.session_id,
            };
            if !matches {
                continue;
            }
            if let Err(err) = subscriber.sender.try_send(event.clone()) {
                tracing::warn!(
                    session_id = %event.session_id,
                    connection_id = ?subscriber.connection_id,
                    error = %err,
                    "dropping event: subscriber queue full or closed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(session_id: &str) -> FlowEvent {
        FlowEvent {
            session_id: session_id.to_string(),
            event: "e".to_string(),
            data: "d".to_string(),
        }
    }

    #[tokio::test]
    async fn session_emit_reaches_all_session_subscribers() {
        let bus = EventBus::new();
        let mut x = bus.add_subscriber("S".to_string(), Some("X".to_string()));
        let mut y = bus.add_subscriber("S".to_string(), None);

        bus.emit(event("S"), None);

        assert_eq!(x.receiver.recv().await.unwrap().event, "e");
        assert_eq!(y.receiver.recv().await.unwrap().event, "e");
    }

    #[tokio::test]
    async fn targeted_emit_reaches_only_that_connection() {
        let bus = EventBus::new();
        let mut x = bus.add_subscriber("S".to_string(), Some("X".to_string()));
        let mut y = bus.add_subscriber("S".to_string(), None);

        bus.emit(event("S"), Some("X"));

        assert!(x.receiver.recv().await.is_some());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(y.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn removed_subscriber_stops_receiving_but_drains_buffered() {
        let bus = EventBus::new();
        let handle = bus.add_subscriber("S".to_string(), None);
        bus.emit(event("S"), None);
        bus.remove_subscriber(handle.id);
        bus.emit(event("S"), None);

        let mut receiver = handle.receiver;
        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }
}
