use async_trait::async_trait;
use serde::Serialize;

use domain::{SessionEvent, UserIdentity};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SessionNotification {
    SessionEvent(SessionEvent),
    /// A local action was refused; nothing was published.
    ActionRefused(String),
}

#[async_trait]
pub trait SessionNotifier: Send + Sync {
    async fn notify(
        &self,
        notification: SessionNotification,
    );
}

/// Source of the stable local identity.
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> UserIdentity;
}
