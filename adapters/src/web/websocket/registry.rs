use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::relay_protocol::{ClientFrame, ServerFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type FrameSender = UnboundedSender<String>;

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, FrameSender>,
    topics: HashMap<String, BTreeSet<ConnectionId>>,
}

/// Topic subscriptions of every relay connection.
///
/// Publishing takes the write lock, which gives each topic a single delivery order
/// shared by all of its subscribers.
pub struct TopicRegistry {
    state: RwLock<RegistryState>,
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub async fn register(
        &self,
        connection: ConnectionId,
        sender: FrameSender,
    ) {
        self.state.write().await.connections.insert(connection, sender);
    }

    pub async fn unregister(
        &self,
        connection: ConnectionId,
    ) {
        let mut state = self.state.write().await;
        state.connections.remove(&connection);
        state.topics.retain(|_, subscribers| {
            subscribers.remove(&connection);
            !subscribers.is_empty()
        });
    }

    pub async fn apply(
        &self,
        connection: ConnectionId,
        frame: ClientFrame,
    ) {
        match frame {
            ClientFrame::Subscribe { topic } => self.subscribe(connection, topic).await,
            ClientFrame::Unsubscribe { topic } => self.unsubscribe(connection, &topic).await,
            ClientFrame::Publish { topic, payload } => {
                let delivered = self.publish(&topic, payload).await;
                debug!(connection = %connection, topic = %topic, delivered, "Published");
            }
        }
    }

    pub async fn subscribe(
        &self,
        connection: ConnectionId,
        topic: String,
    ) {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(&connection) {
            return;
        }
        debug!(connection = %connection, topic = %topic, "Subscribed");
        state.topics.entry(topic).or_default().insert(connection);
    }

    pub async fn unsubscribe(
        &self,
        connection: ConnectionId,
        topic: &str,
    ) {
        let mut state = self.state.write().await;
        if let Some(subscribers) = state.topics.get_mut(topic) {
            subscribers.remove(&connection);
            if subscribers.is_empty() {
                state.topics.remove(topic);
            }
        }
    }

    /// Fans `payload` out to the topic's subscribers and returns how many were reached.
    pub async fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> usize {
        let frame = ServerFrame::Message {
            topic: topic.to_string(),
            payload,
        };
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!(topic, error = %e, "Could not encode frame");
                return 0;
            }
        };

        let state = self.state.write().await;
        let Some(subscribers) = state.topics.get(topic) else {
            return 0;
        };
        subscribers
            .iter()
            .filter_map(|connection| state.connections.get(connection))
            .filter(|sender| sender.send(json.clone()).is_ok())
            .count()
    }

    pub async fn send_error(
        &self,
        connection: ConnectionId,
        message: String,
    ) {
        let Ok(json) = serde_json::to_string(&ServerFrame::Error { message }) else {
            return;
        };
        if let Some(sender) = self.state.read().await.connections.get(&connection) {
            let _ = sender.send(json);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Subscriber counts per topic, sorted by topic name.
    pub async fn topic_counts(&self) -> Vec<(String, usize)> {
        let state = self.state.read().await;
        let mut counts: Vec<(String, usize)> =
            state.topics.iter().map(|(topic, subscribers)| (topic.clone(), subscribers.len())).collect();
        counts.sort();
        counts
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}
