use std::io;
use std::sync::Arc;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use adapters::{ChannelNotifier, StaticIdentity, SystemClock, TokioTimer, WebSocketTransport};
use application::ports::in_::GameClient;
use application::ports::out_::IdentityProvider;
use domain::SessionConfig;

mod autoplay;
mod strategy;

use autoplay::AutoPlayer;

/// Headless gomoku participant: connects to a relay, finds an opponent and plays
/// random moves next to the stones already on the board.
#[derive(Parser)]
#[command(name = "player")]
struct Args {
    /// Relay WebSocket URL
    #[arg(long, env = "RELAY_URL", default_value = "ws://localhost:8080/ws")]
    url: String,

    /// Stable participant id; a random one is generated when omitted
    #[arg(long, env = "PLAYER_ID")]
    id: Option<String>,

    /// Display name announced to opponents
    #[arg(long, env = "PLAYER_NAME", default_value = "player")]
    name: String,

    /// Games to play before exiting
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Seconds allowed per turn
    #[arg(long, default_value_t = 30)]
    turn_seconds: u32,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let identity = match args.id {
        Some(id) => StaticIdentity::new(id, args.name),
        None => StaticIdentity::generated(args.name),
    };
    let me = identity.identity();
    info!(user_id = %me.id, name = %me.name, url = %args.url, "Starting player");

    let config = SessionConfig {
        turn_seconds: args.turn_seconds,
        ..SessionConfig::default()
    };
    let (transport, events) = WebSocketTransport::connect(&args.url).await.map_err(io::Error::other)?;
    let (notification_tx, mut notifications) = mpsc::unbounded_channel();

    let client = GameClient::new(
        &identity,
        config,
        Arc::new(transport),
        Arc::new(ChannelNotifier::new(notification_tx)),
        Arc::new(SystemClock),
        Arc::new(TokioTimer::new()),
    );

    let runner = client.clone();
    tokio::spawn(async move {
        runner.run(events).await;
    });

    let mut player = AutoPlayer::new(me.id, args.games, StdRng::from_entropy());
    while let Some(notification) = notifications.recv().await {
        let snapshot = client.snapshot().await;
        for action in player.react(&notification, &snapshot) {
            if let Err(e) = client.execute(action).await {
                debug!(action = ?action, error = %e, "Skipped action");
            }
        }
        if player.is_done() {
            break;
        }
    }

    info!(played = player.played(), won = player.won(), "Player finished");
    Ok(())
}
