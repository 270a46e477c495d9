/// Outbound real-time events and the topics they are published on.
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::{Message, Post};

use super::BroadcastRegistry;

/// Global feed topic; every connection is subscribed on connect.
pub const FEED_TOPIC: &str = "feed";

/// Event names on the wire.
pub const NEW_TWEET: &str = "new-tweet";
pub const POST_LIKED: &str = "post-liked";
pub const POST_RESHARED: &str = "post-reshared";
pub const POST_COMMENTED: &str = "post-commented";
pub const NEW_MESSAGE: &str = "new-message";

/// Topic carrying events for a single post.
pub fn post_topic(post_id: Uuid) -> String {
    format!("post:{}", post_id)
}

/// Topic carrying direct messages for one user.
pub fn inbox_topic(email: &str) -> String {
    format!("inbox:{}", email)
}

/// Envelope for every outbound event: `{"event": ..., "data": ...}`.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    event: &'a str,
    data: &'a T,
}

fn encode<T: Serialize>(event: &str, data: &T) -> Option<String> {
    match serde_json::to_string(&Envelope { event, data }) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::error!(event, error = %err, "Failed to serialize event payload");
            None
        }
    }
}

/// Publish a post mutation: once on the global feed topic and once on the
/// per-post topic. The payload is the full, freshly-read post document.
pub async fn publish_post_event(registry: &BroadcastRegistry, event: &str, post: &Post) {
    let Some(payload) = encode(event, post) else {
        return;
    };
    registry.broadcast(FEED_TOPIC, payload.clone()).await;
    registry.broadcast(&post_topic(post.id), payload).await;
}

/// Publish a direct message to both participants' inbox topics.
pub async fn publish_message_event(registry: &BroadcastRegistry, message: &Message) {
    let Some(payload) = encode(NEW_MESSAGE, message) else {
        return;
    };
    registry
        .broadcast(&inbox_topic(&message.to), payload.clone())
        .await;
    if message.from != message.to {
        registry.broadcast(&inbox_topic(&message.from), payload).await;
    }
}
