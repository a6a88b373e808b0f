use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::relay_protocol::ClientFrame;
use crate::web::state::RelayState;

use super::registry::ConnectionId;

pub async fn handle_connection(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let connection = ConnectionId::new();
        info!(connection = %connection, "Client connected");

        let (mut sender, receiver) = socket.split();
        let (frames, mut outbound) = mpsc::unbounded_channel::<String>();
        state.registry.register(connection, frames).await;

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        });

        handle_frames(connection, receiver, &state).await;

        state.registry.unregister(connection).await;
        writer.abort();
        info!(connection = %connection, "Client disconnected");
    })
}

async fn handle_frames(
    connection: ConnectionId,
    mut receiver: SplitStream<WebSocket>,
    state: &RelayState,
) {
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => {
                debug!(connection = %connection, frame = %text.as_str(), "<- Received");
                match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => state.registry.apply(connection, frame).await,
                    Err(e) => {
                        warn!(connection = %connection, error = %e, "Failed to parse frame");
                        state.registry.send_error(connection, format!("unrecognized frame: {e}")).await;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
