use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use application::ports::out_::{AsyncTimer, Clock};
use domain::Millis;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl TokioTimer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AsyncTimer for TokioTimer {
    async fn sleep(
        &self,
        duration: Duration,
    ) {
        tokio::time::sleep(duration).await;
    }
}
