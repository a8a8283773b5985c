//! # Relay Hub
//!
//! Accepts WebSocket connections from sensor devices and game clients and
//! relays sensor frames and presence between them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use motion_relay::config::Config;
use motion_relay::hub::HubServer;
use motion_relay::logging::init_logging;

/// Configuration file used when `--config` is omitted and it exists.
const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

#[derive(Debug, Parser)]
#[command(name = "relay-hub", version, about = "Relay motion sensor frames between devices and games")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the plaintext listener port
    #[arg(short, long)]
    port: Option<u16>,
}

/// Loads the configuration from `path`, the default path, or built-in defaults.
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display())),
        None if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

/// Main entry point for the relay hub
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse CLI arguments and load configuration
///    - Set up logging (console, optional rolling file)
///    - Bind the plaintext listener and, when configured, the TLS listener
///
/// 2. **Main Loop**
///    - Accept connections and relay frames until Ctrl+C
///    - Log a connection snapshot every `snapshot_interval_s`
///
/// 3. **Graceful Shutdown**
///    - Stop accepting, close every connection, flush logs
///
/// # Examples
///
/// ```bash
/// cargo run --release --bin relay-hub -- --port 9000
/// ```
///
/// Expected output:
/// ```text
/// INFO relay_hub: Motion Relay hub v0.1.0 starting...
/// INFO motion_relay::hub::server: Hub listening on ws://0.0.0.0:9000
/// INFO motion_relay::hub: Connection conn-1 accepted from 192.168.1.23:53412 (1 open)
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(port) = cli.port {
        config.hub.port = port;
        config.validate()?;
    }

    let _log_guard = init_logging(&config.logging)?;
    info!("Motion Relay hub v{} starting...", env!("CARGO_PKG_VERSION"));

    let server = HubServer::bind(config.hub.clone())
        .await
        .context("binding hub listeners")?;

    let cancel = CancellationToken::new();
    let server_task = tokio::spawn(server.run(cancel.clone()));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    cancel.cancel();

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Hub stopped with error: {}", e),
        Err(e) => error!("Hub task failed: {}", e),
    }

    Ok(())
}
