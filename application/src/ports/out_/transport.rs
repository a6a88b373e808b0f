use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
    #[error("could not encode frame: {0}")]
    Encode(String),
    #[error("transport i/o failed: {0}")]
    Io(String),
}

/// Inbound side of a publish/subscribe connection. Adapters hand these out on an
/// unbounded channel when they connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Message { topic: String, payload: String },
    Error(String),
}

/// Outbound side of a publish/subscribe connection.
///
/// Implementations must deliver a topic's messages to every subscriber in one order,
/// including back to the publisher when it is subscribed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError>;

    async fn unsubscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError>;

    async fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> Result<(), TransportError>;
}
