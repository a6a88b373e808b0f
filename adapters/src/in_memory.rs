use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use application::ports::out_::{AsyncTimer, Clock, SessionNotification, SessionNotifier};
use domain::{Millis, SessionEvent};

/// Recording notifier, hand-cranked clock and gated timer for tests and simulations.
///
/// Sleeps park until `fire_timers` releases them, so delayed actions run exactly when a
/// test asks for them.
pub struct InMemory {
    notifications: RwLock<Vec<SessionNotification>>,
    pending_timers: Mutex<Vec<(Duration, oneshot::Sender<()>)>>,
    now: AtomicU64,
}

impl InMemory {
    pub fn new() -> Self {
        Self {
            notifications: RwLock::new(Vec::new()),
            pending_timers: Mutex::new(Vec::new()),
            now: AtomicU64::new(1_000),
        }
    }

    pub fn get_notifications(&self) -> Vec<SessionNotification> {
        self.notifications.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.get_notifications()
            .into_iter()
            .filter_map(|notification| match notification {
                SessionNotification::SessionEvent(event) => Some(event),
                SessionNotification::ActionRefused(_) => None,
            })
            .collect()
    }

    pub fn clear_notifications(&self) {
        self.notifications.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Durations of the sleeps currently parked.
    pub fn pending_timers(&self) -> Vec<Duration> {
        self.pending_timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(duration, _)| *duration)
            .collect()
    }

    /// Releases every parked sleep and returns how many there were.
    pub fn fire_timers(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending_timers.lock().unwrap_or_else(PoisonError::into_inner));
        let count = pending.len();
        for (_, release) in pending {
            let _ = release.send(());
        }
        count
    }

    pub fn advance_clock(
        &self,
        by: Duration,
    ) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionNotifier for InMemory {
    async fn notify(
        &self,
        notification: SessionNotification,
    ) {
        self.notifications.write().unwrap_or_else(PoisonError::into_inner).push(notification);
    }
}

#[async_trait]
impl AsyncTimer for InMemory {
    async fn sleep(
        &self,
        duration: Duration,
    ) {
        let (release, released) = oneshot::channel();
        self.pending_timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((duration, release));
        let _ = released.await;
    }
}

impl Clock for InMemory {
    fn now_millis(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
