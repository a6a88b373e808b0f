use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use application::ports::out_::{Transport, TransportError, TransportEvent};

use crate::relay_protocol::{ClientFrame, ServerFrame};

/// Client side of the topic relay.
///
/// Frames go out through a writer task; inbound frames come back as `TransportEvent`s
/// on the stream returned by `connect`.
pub struct WebSocketTransport {
    outgoing: UnboundedSender<String>,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> Result<(Self, UnboundedReceiver<TransportEvent>), TransportError> {
        let (stream, _) = connect_async(url).await.map_err(|e| TransportError::Io(e.to_string()))?;
        info!(url, "Connected to relay");

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let (events, events_rx) = mpsc::unbounded_channel();
        let _ = events.send(TransportEvent::Connected);

        let (mut write, mut read) = stream.split();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outgoing_rx.recv() => {
                        match frame {
                            Some(json) => {
                                if write.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.close().await;
                                break;
                            }
                        }
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text) {
                                Ok(ServerFrame::Message { topic, payload }) => {
                                    let _ = events.send(TransportEvent::Message { topic, payload });
                                }
                                Ok(ServerFrame::Error { message }) => {
                                    let _ = events.send(TransportEvent::Error(message));
                                }
                                Err(e) => {
                                    warn!(error = %e, raw = %text.as_str(), "Failed to parse relay frame");
                                }
                            },
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Err(e)) => {
                                let _ = events.send(TransportEvent::Error(e.to_string()));
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }
            info!("Relay connection closed");
            let _ = events.send(TransportEvent::Disconnected);
        });

        Ok((Self { outgoing }, events_rx))
    }

    fn send(
        &self,
        frame: &ClientFrame,
    ) -> Result<(), TransportError> {
        let json = serde_json::to_string(frame).map_err(|e| TransportError::Encode(e.to_string()))?;
        debug!(frame = %json, "-> Relay");
        self.outgoing.send(json).map_err(|_| TransportError::NotConnected)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError> {
        self.send(&ClientFrame::Subscribe {
            topic: topic.to_string(),
        })
    }

    async fn unsubscribe(
        &self,
        topic: &str,
    ) -> Result<(), TransportError> {
        self.send(&ClientFrame::Unsubscribe {
            topic: topic.to_string(),
        })
    }

    async fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> Result<(), TransportError> {
        self.send(&ClientFrame::Publish {
            topic: topic.to_string(),
            payload,
        })
    }
}
