use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use application::ports::out_::{Transport, TransportError, TransportEvent};
use domain::WireMessage;

#[derive(Default)]
struct BusState {
    next_client: u64,
    clients: HashMap<u64, UnboundedSender<TransportEvent>>,
    subscriptions: HashMap<String, BTreeSet<u64>>,
    log: Vec<(String, String)>,
}

/// In-process publish/subscribe broker.
///
/// Publishes are serialized by one lock, so every subscriber of a topic sees the same
/// order. Publishers subscribed to a topic get their own messages back.
#[derive(Default)]
pub struct InMemoryBus {
    state: Mutex<BusState>,
}

impl InMemoryBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens a client connection. `Connected` is already queued on the returned stream.
    pub fn connect(self: &Arc<Self>) -> (InMemoryTransport, UnboundedReceiver<TransportEvent>) {
        let (events, stream) = mpsc::unbounded_channel();
        let _ = events.send(TransportEvent::Connected);

        let mut state = self.lock();
        let client = state.next_client;
        state.next_client += 1;
        state.clients.insert(client, events);

        let transport = InMemoryTransport {
            bus: Arc::clone(self),
            client,
        };
        (transport, stream)
    }

    /// Drops a client as if its connection broke.
    pub fn disconnect(
        &self,
        transport: &InMemoryTransport,
    ) {
        let mut state = self.lock();
        for subscribers in state.subscriptions.values_mut() {
            subscribers.remove(&transport.client);
        }
        if let Some(events) = state.clients.remove(&transport.client) {
            let _ = events.send(TransportEvent::Disconnected);
        }
    }

    /// Every `(topic, payload)` published so far, in bus order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.lock().log.clone()
    }

    /// Decoded messages published on `topic`; payloads that do not decode are skipped.
    pub fn messages_on(
        &self,
        topic: &str,
    ) -> Vec<WireMessage> {
        self.lock()
            .log
            .iter()
            .filter(|(t, _)| t == topic)
            .filter_map(|(_, payload)| WireMessage::decode(payload.as_bytes()).ok())
            .collect()
    }

    pub fn subscriber_count(
        &self,
        topic: &str,
    ) -> usize {
        self.lock().subscriptions.get(topic).map_or(0, BTreeSet::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct InMemoryTransport {
    bus: Arc<InMemoryBus>,
    client: u64,
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.bus.lock();
        if !state.clients.contains_key(&self.client) {
            return Err(TransportError::NotConnected);
        }
        state.subscriptions.entry(topic.to_string()).or_default().insert(self.client);
        Ok(())
    }

    async fn unsubscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.bus.lock();
        if !state.clients.contains_key(&self.client) {
            return Err(TransportError::NotConnected);
        }
        if let Some(subscribers) = state.subscriptions.get_mut(topic) {
            subscribers.remove(&self.client);
        }
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> Result<(), TransportError> {
        let mut state = self.bus.lock();
        if !state.clients.contains_key(&self.client) {
            return Err(TransportError::NotConnected);
        }
        state.log.push((topic.to_string(), payload.clone()));

        let subscribers = state.subscriptions.get(topic).cloned().unwrap_or_default();
        debug!(topic, subscribers = subscribers.len(), "Bus publish");
        for client in subscribers {
            if let Some(events) = state.clients.get(&client) {
                let _ = events.send(TransportEvent::Message {
                    topic: topic.to_string(),
                    payload: payload.clone(),
                });
            }
        }
        Ok(())
    }
}
