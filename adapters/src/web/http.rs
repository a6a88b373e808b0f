use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::state::RelayState;

#[derive(Debug, Serialize)]
pub struct TopicStats {
    topic: String,
    subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    connections: usize,
    topics: Vec<TopicStats>,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_topics(State(state): State<Arc<RelayState>>) -> Json<TopicsResponse> {
    let topics = state
        .registry
        .topic_counts()
        .await
        .into_iter()
        .map(|(topic, subscribers)| TopicStats { topic, subscribers })
        .collect();
    let connections = state.registry.connection_count().await;
    Json(TopicsResponse { connections, topics })
}
