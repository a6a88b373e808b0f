use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as TokioMutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::ports::out_::{
    AsyncTimer, Clock, IdentityProvider, SessionNotification, SessionNotifier, Transport, TransportEvent,
};
use domain::{LocalAction, Peer, SessionConfig, SessionEffect, SessionError, SessionSnapshot, TimedAction};

pub type DynTransport = Arc<dyn Transport>;
pub type DynNotifier = Arc<dyn SessionNotifier>;

/// Drives one participant: feeds local actions, transport events, ticks and delayed
/// actions into the `Peer` and performs the effects it returns.
///
/// Effects are carried out while the peer is locked, so inputs never interleave.
#[derive(Clone)]
pub struct GameClient {
    peer: Arc<TokioMutex<Peer>>,
    transport: DynTransport,
    notifier: DynNotifier,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn AsyncTimer>,
}

impl GameClient {
    pub fn new(
        identity: &dyn IdentityProvider,
        config: SessionConfig,
        transport: DynTransport,
        notifier: DynNotifier,
        clock: Arc<dyn Clock>,
        timer: Arc<dyn AsyncTimer>,
    ) -> Self {
        Self::with_peer(Peer::new(identity.identity(), config), transport, notifier, clock, timer)
    }

    pub fn with_peer(
        peer: Peer,
        transport: DynTransport,
        notifier: DynNotifier,
        clock: Arc<dyn Clock>,
        timer: Arc<dyn AsyncTimer>,
    ) -> Self {
        Self {
            peer: Arc::new(TokioMutex::new(peer)),
            transport,
            notifier,
            clock,
            timer,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.peer.lock().await.snapshot()
    }

    /// Runs a local action. A refused action publishes nothing and is reported to the
    /// notifier as well as returned.
    pub async fn execute(
        &self,
        action: LocalAction,
    ) -> Result<(), SessionError> {
        let mut peer = self.peer.lock().await;
        let now = self.clock.now_millis();
        match peer.process_action(action, now) {
            Ok(effects) => {
                self.process_effects(effects).await;
                Ok(())
            }
            Err(e) => {
                debug!(action = ?action, error = %e, "Action refused");
                self.notifier.notify(SessionNotification::ActionRefused(e.to_string())).await;
                Err(e)
            }
        }
    }

    pub async fn handle_event(
        &self,
        event: TransportEvent,
    ) {
        let mut peer = self.peer.lock().await;
        let now = self.clock.now_millis();
        let effects = match event {
            TransportEvent::Connected => peer.on_connected(),
            TransportEvent::Disconnected => peer.on_disconnected(),
            TransportEvent::Message { topic, payload } => {
                debug!(topic = %topic, payload = %payload, "<- Received");
                peer.dispatch(&topic, payload.as_bytes(), now)
            }
            TransportEvent::Error(message) => {
                warn!(message = %message, "Transport error");
                vec![]
            }
        };
        self.process_effects(effects).await;
    }

    pub async fn tick(
        &self,
        elapsed_secs: u32,
    ) {
        let mut peer = self.peer.lock().await;
        let effects = peer.tick(elapsed_secs, self.clock.now_millis());
        self.process_effects(effects).await;
    }

    pub async fn fire(
        &self,
        action: TimedAction,
    ) {
        let mut peer = self.peer.lock().await;
        let effects = peer.fire(action, self.clock.now_millis());
        self.process_effects(effects).await;
    }

    /// Pumps transport events and the turn-timer tick until the event stream closes.
    pub async fn run(
        &self,
        mut events: UnboundedReceiver<TransportEvent>,
    ) {
        let elapsed_secs = self.peer.lock().await.config().tick_seconds();
        let period = Duration::from_secs(u64::from(elapsed_secs));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        self.handle_event(TransportEvent::Disconnected).await;
                        break;
                    }
                },
                _ = ticker.tick() => self.tick(elapsed_secs).await,
            }
        }
        info!("Transport event stream closed");
    }

    async fn process_effects(
        &self,
        effects: Vec<SessionEffect>,
    ) {
        for effect in effects {
            match effect {
                SessionEffect::Publish { topic, message } => match message.encode() {
                    Ok(payload) => {
                        debug!(topic = %topic, payload = %payload, "-> Publishing");
                        if let Err(e) = self.transport.publish(&topic, payload).await {
                            warn!(topic = %topic, error = %e, "Publish failed");
                        }
                    }
                    Err(e) => warn!(topic = %topic, error = %e, "Could not encode message"),
                },
                SessionEffect::Subscribe { topic } => {
                    if let Err(e) = self.transport.subscribe(&topic).await {
                        warn!(topic = %topic, error = %e, "Subscribe failed");
                    }
                }
                SessionEffect::Unsubscribe { topic } => {
                    if let Err(e) = self.transport.unsubscribe(&topic).await {
                        warn!(topic = %topic, error = %e, "Unsubscribe failed");
                    }
                }
                SessionEffect::DelayedAction { delay, action } => self.schedule(delay, action),
                SessionEffect::Notify(event) => {
                    self.notifier.notify(SessionNotification::SessionEvent(event)).await;
                }
            }
        }
    }

    fn schedule(
        &self,
        delay: Duration,
        action: TimedAction,
    ) {
        debug!(delay = ?delay, action = ?action, "Scheduling delayed action");
        let client = self.clone();
        tokio::spawn(async move {
            client.timer.sleep(delay).await;
            fire_later(client, action).await;
        });
    }
}

/// Boxed to give the fire -> schedule -> fire chain a nameable future type.
fn fire_later(
    client: GameClient,
    action: TimedAction,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        client.fire(action).await;
    })
}
