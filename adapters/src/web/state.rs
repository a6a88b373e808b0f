use std::sync::Arc;

use super::websocket::TopicRegistry;

pub struct RelayState {
    pub registry: Arc<TopicRegistry>,
}

impl RelayState {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self { registry }
    }
}

pub fn create_relay_state() -> Arc<RelayState> {
    Arc::new(RelayState::new(Arc::new(TopicRegistry::new())))
}
