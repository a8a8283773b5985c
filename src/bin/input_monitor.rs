//! # Input Monitor
//!
//! Connects to a relay hub as a game client and logs the mapped input.
//! Useful for tuning mapping profiles against a real phone.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use motion_relay::client::{ConnectionClient, Endpoint, PeerEvent, WebSocketConnector};
use motion_relay::config::{Config, MappingConfig};
use motion_relay::input::Preset;
use motion_relay::logging::init_logging;

/// How often the current input is logged.
const REPORT_INTERVAL_MS: u64 = 500;

#[derive(Debug, Parser)]
#[command(name = "input-monitor", version, about = "Log game input mapped from relayed motion sensors")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hub URL (`ws://` or `wss://`), overrides the origin
    #[arg(short, long)]
    url: Option<String>,

    /// Page origin used to derive the hub URL
    #[arg(short, long)]
    origin: Option<String>,

    /// Mapping preset, replaces the configured mapping
    #[arg(short, long)]
    preset: Option<Preset>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(url) = cli.url {
        config.client.url = Some(url);
    }
    if let Some(origin) = cli.origin {
        config.client.origin = origin;
        config.client.url = None;
    }
    if let Some(preset) = cli.preset {
        config.mapping = MappingConfig::from_preset(preset);
    }

    let _log_guard = init_logging(&config.logging)?;
    info!("Motion Relay input monitor v{} starting...", env!("CARGO_PKG_VERSION"));

    let endpoint = Endpoint::from_config(&config.client)?;
    let profile = config.mapping.resolve()?;
    info!("Hub endpoint: {} (preset {:?})", endpoint, config.mapping.preset);

    let connector = Arc::new(WebSocketConnector::new(endpoint, config.client.connect_timeout()));
    let client = ConnectionClient::start(&config.client, profile, connector)?;
    info!("Device id: {}", client.device_id());

    client.on_peer(|event| match event {
        PeerEvent::Joined(_) => info!("{} joined", event.name()),
        PeerEvent::Left(_) => info!("{} left", event.name()),
    });
    client.on_input(|input, _| {
        if input.any_pulse() {
            info!(
                "Pulse: jump={} shoot={} action={}",
                input.jump, input.shoot, input.action
            );
        }
    });

    let mut report = interval(Duration::from_millis(REPORT_INTERVAL_MS));
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Press Ctrl+C to exit");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            _ = report.tick() => {
                let input = client.current_input();
                info!(
                    "[{}] x={:+.2} y={:+.2} brake={:.2} speed={:.2}",
                    client.status(),
                    input.x,
                    input.y,
                    input.brake,
                    input.speed
                );
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_preset() {
        let cli = Cli::parse_from(["input-monitor", "--preset", "racing", "--url", "ws://hub:8080"]);
        assert_eq!(cli.preset, Some(Preset::Racing));
        assert_eq!(cli.url.as_deref(), Some("ws://hub:8080"));
    }

    #[test]
    fn test_cli_rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["input-monitor", "--preset", "pinball"]).is_err());
    }

    #[test]
    fn test_report_interval() {
        assert!(REPORT_INTERVAL_MS >= 100);
    }
}
