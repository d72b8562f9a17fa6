use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Session events broadcast to interested parts of the application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    LoggedIn {
        user_id: String,
        username: String,
    },
    LoggedOut,
    /// A new token pair was obtained and stored
    TokensRefreshed,
    Custom {
        event_name: String,
        payload: serde_json::Value,
    },
}

/// Fan-out of session events
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<Event>>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster
    ///
    /// # Arguments
    /// * `capacity` - The capacity of the broadcast channel (default: 100)
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Broadcast an event to all subscribers
    ///
    /// # Returns
    /// The number of receivers that received the event
    pub fn broadcast(&self, event: Event) -> usize {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                tracing::debug!(target: "events", subscribers = count, "Broadcast event to subscriber(s)");
                tracing::trace!(target: "events", event = ?event, "Event details");
                count
            }
            Err(_) => {
                tracing::trace!(target: "events", event = ?event, "No active subscribers for event");
                0
            }
        }
    }

    pub fn logged_in(&self, user_id: String, username: String) {
        self.broadcast(Event::LoggedIn { user_id, username });
    }

    pub fn logged_out(&self) {
        self.broadcast(Event::LoggedOut);
    }

    pub fn tokens_refreshed(&self) {
        self.broadcast(Event::TokensRefreshed);
    }

    pub fn custom_event(&self, event_name: String, payload: serde_json::Value) {
        self.broadcast(Event::Custom {
            event_name,
            payload,
        });
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_broadcasting() {
        let broadcaster = EventBroadcaster::new(10);
        let mut receiver = broadcaster.subscribe();

        broadcaster.logged_in("u1".to_string(), "viewer".to_string());
        broadcaster.tokens_refreshed();

        match receiver.recv().await.unwrap() {
            Event::LoggedIn { user_id, username } => {
                assert_eq!(user_id, "u1");
                assert_eq!(username, "viewer");
            }
            other => panic!("Expected LoggedIn event, got {:?}", other),
        }
        assert!(matches!(receiver.recv().await.unwrap(), Event::TokensRefreshed));
    }

    #[test]
    fn broadcast_without_subscribers_reaches_nobody() {
        let broadcaster = EventBroadcaster::default();
        assert_eq!(broadcaster.subscriber_count(), 0);
        assert_eq!(broadcaster.broadcast(Event::LoggedOut), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::Custom {
            event_name: "player:resume".to_string(),
            payload: serde_json::json!({ "videoId": "v1" }),
        })
        .unwrap();
        assert_eq!(json["type"], "Custom");
        assert_eq!(json["data"]["event_name"], "player:resume");
    }
}
