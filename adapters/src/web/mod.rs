mod http;
mod state;
mod websocket;

pub use http::{TopicStats, TopicsResponse, get_topics, health};
pub use state::{RelayState, create_relay_state};
pub use websocket::{ConnectionId, TopicRegistry, handle_connection};
