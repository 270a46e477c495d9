use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;
pub mod session;

/// Unique identifier for a WebSocket subscriber.
///
/// Each subscription gets its own ID so a closing connection can be removed
/// precisely, without disturbing other subscribers of the same topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber entry with ID and channel
struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

/// Topic-scoped broadcast registry.
///
/// Tracks which WebSocket connections are subscribed to which topics
/// (`feed`, `post:{id}`, `inbox:{email}`). Events only reach connections
/// subscribed to the relevant topic, instead of every client on the server.
#[derive(Default, Clone)]
pub struct BroadcastRegistry {
    // topic -> list of subscribers
    inner: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber to a topic.
    ///
    /// Returns the subscription ID (used for cleanup) and the channel that
    /// receives broadcast payloads.
    pub async fn add_subscriber(&self, topic: &str) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.entry(topic.to_string()).or_default().push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });

        tracing::debug!(
            topic,
            subscribers = guard.get(topic).map(|v| v.len()).unwrap_or(0),
            "Added subscriber"
        );

        (subscriber_id, rx)
    }

    /// Remove a specific subscriber from a topic.
    ///
    /// Must be called when a WebSocket connection closes or unsubscribes,
    /// otherwise the entry leaks until the next broadcast prunes it.
    pub async fn remove_subscriber(&self, topic: &str, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;

        if let Some(subscribers) = guard.get_mut(topic) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(topic);
            }
        }
    }

    /// Broadcast a payload to all subscribers of a topic.
    ///
    /// Dead senders (closed connections) are pruned on the way.
    pub async fn broadcast(&self, topic: &str, payload: String) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(topic) {
            let before = subscribers.len();
            subscribers.retain(|subscriber| subscriber.sender.send(payload.clone()).is_ok());

            if subscribers.len() != before {
                tracing::debug!(
                    topic,
                    pruned = before - subscribers.len(),
                    active = subscribers.len(),
                    "Pruned dead subscribers during broadcast"
                );
            }
            if subscribers.is_empty() {
                guard.remove(topic);
            }
        }
    }

    /// Subscriber count for a topic (for debugging/tests)
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let guard = self.inner.read().await;
        guard.get(topic).map(|v| v.len()).unwrap_or(0)
    }
}
