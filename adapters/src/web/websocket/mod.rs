mod handler;
mod registry;

pub use handler::handle_connection;
pub use registry::{ConnectionId, TopicRegistry};
