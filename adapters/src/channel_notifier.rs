use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use application::ports::out_::{SessionNotification, SessionNotifier};

/// Forwards notifications to a channel, for front-ends that consume them in their own loop.
pub struct ChannelNotifier {
    sender: UnboundedSender<SessionNotification>,
}

impl ChannelNotifier {
    pub fn new(sender: UnboundedSender<SessionNotification>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl SessionNotifier for ChannelNotifier {
    async fn notify(
        &self,
        notification: SessionNotification,
    ) {
        let _ = self.sender.send(notification);
    }
}
