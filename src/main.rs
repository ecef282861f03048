//! ChaTTY telnet chat server - Entry Point
//!
//! Loads the configuration, starts the ChatServer actor and accepts
//! connections until Ctrl-C.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatty::{serve, ChatServer, Config, ServerHandle};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chatty=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatty=info")),
        )
        .init();

    // Optional TOML config path as the first argument
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = Arc::new(Config::load(config_path.as_deref())?);

    // Start TCP listener
    let listener = TcpListener::bind(config.addr()).await?;
    info!(
        "Started ChaTTY server on {}. (Ctrl-C to stop)",
        listener.local_addr()?
    );

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = ChatServer::new(cmd_rx, config.statuses.clone());
    tokio::spawn(server.run());

    info!("ChatServer actor started");

    tokio::spawn(serve(listener, ServerHandle::new(cmd_tx), config));

    tokio::signal::ctrl_c().await?;
    info!("Server shut down.");

    Ok(())
}
