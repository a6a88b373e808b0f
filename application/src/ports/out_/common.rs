use std::time::Duration;

use async_trait::async_trait;

use domain::Millis;

#[async_trait]
pub trait AsyncTimer: Send + Sync {
    async fn sleep(
        &self,
        duration: Duration,
    );
}

/// Wall-clock time in milliseconds since the Unix epoch, as stamped on wire messages.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Millis;
}
