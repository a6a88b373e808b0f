use std::io;
use std::net::SocketAddr;

use axum::{Router, routing::get};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing::info;

use adapters::web::{create_relay_state, get_topics, handle_connection, health};

/// Topic relay for gomoku peers. Fans published payloads out to subscribers and never
/// looks inside them.
#[derive(Parser)]
#[command(name = "relay")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RELAY_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let state = create_relay_state();

    let app = Router::new()
        .route("/ws", get(handle_connection))
        .route("/health", get(health))
        .route("/topics", get(get_topics))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Relay listening");
    axum::serve(listener, app).await?;
    info!("Relay shut down");
    Ok(())
}
