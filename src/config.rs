//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values fall back to the
//! `default_*` functions below. An empty file is a valid configuration.
//!
//! ```toml
//! [hub]
//! port = 8080
//!
//! [hub.tls]
//! cert_path = "certs/hub.pem"
//! key_path = "certs/hub.key"
//!
//! [client]
//! origin = "https://game.local"
//!
//! [mapping]
//! preset = "racing"
//! jump = { channel = "accelerometer", threshold = 18.0, cooldown_ms = 400 }
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::input::{AxisSpec, MappingProfile, Preset, SimulationSettings, TriggerSpec};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub hub: HubConfig,
    pub client: ClientConfig,
    pub mapping: MappingConfig,
    pub logging: LoggingConfig,
}

/// Relay hub listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Plaintext port; `0` picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_snapshot_interval_s")]
    pub snapshot_interval_s: u64,

    /// Frames buffered per connection before new ones are dropped.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Encrypted listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    #[serde(default = "default_tls_port")]
    pub port: u16,

    pub cert_path: PathBuf,

    pub key_path: PathBuf,
}

/// Game client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Page origin the hub address is derived from.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Explicit `ws://` or `wss://` URL, bypassing origin derivation.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_port")]
    pub plain_port: u16,

    #[serde(default = "default_tls_port")]
    pub secure_port: u16,

    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_blend_rate")]
    pub blend_rate: f32,

    #[serde(default)]
    pub invert_y: bool,

    /// Live sessions fall back to simulation after this long without a frame.
    #[serde(default = "default_sensor_timeout_ms")]
    pub sensor_timeout_ms: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub game_type: Option<String>,

    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
}

/// Mapping profile: a preset plus per-field overrides
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MappingConfig {
    #[serde(default)]
    pub preset: Preset,

    #[serde(default)]
    pub x: Option<AxisSpec>,
    #[serde(default)]
    pub y: Option<AxisSpec>,
    #[serde(default)]
    pub brake: Option<AxisSpec>,
    #[serde(default)]
    pub speed: Option<AxisSpec>,
    #[serde(default)]
    pub jump: Option<TriggerSpec>,
    #[serde(default)]
    pub shoot: Option<TriggerSpec>,
    #[serde(default)]
    pub action: Option<TriggerSpec>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_tls_port() -> u16 {
    8443
}

fn default_snapshot_interval_s() -> u64 {
    30
}

fn default_outbound_queue() -> usize {
    256
}

fn default_send_timeout_ms() -> u64 {
    1000
}

fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_reconnect_backoff_ms() -> u64 {
    3000
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_history_capacity() -> usize {
    5
}

fn default_tick_ms() -> u64 {
    16
}

fn default_blend_rate() -> f32 {
    0.15
}

fn default_sensor_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            snapshot_interval_s: default_snapshot_interval_s(),
            outbound_queue: default_outbound_queue(),
            send_timeout_ms: default_send_timeout_ms(),
            tls: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            url: None,
            plain_port: default_port(),
            secure_port: default_tls_port(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            history_capacity: default_history_capacity(),
            tick_ms: default_tick_ms(),
            blend_rate: default_blend_rate(),
            invert_y: false,
            sensor_timeout_ms: default_sensor_timeout_ms(),
            name: None,
            game_type: None,
            capabilities: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

impl HubConfig {
    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_s)
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("hub host cannot be empty"));
        }

        if self.snapshot_interval_s == 0 || self.snapshot_interval_s > 3600 {
            return Err(invalid("snapshot_interval_s must be between 1 and 3600"));
        }

        if self.outbound_queue == 0 || self.outbound_queue > 65536 {
            return Err(invalid("outbound_queue must be between 1 and 65536"));
        }

        if self.send_timeout_ms == 0 || self.send_timeout_ms > 60000 {
            return Err(invalid("send_timeout_ms must be between 1 and 60000"));
        }

        if let Some(tls) = &self.tls {
            if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
                return Err(invalid("tls cert_path and key_path cannot be empty"));
            }
            if tls.port != 0 && tls.port == self.port {
                return Err(invalid("tls port must differ from the plaintext port"));
            }
        }

        Ok(())
    }
}

impl ClientConfig {
    #[must_use]
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    #[must_use]
    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms)
    }

    #[must_use]
    pub fn simulation_settings(&self) -> SimulationSettings {
        SimulationSettings {
            blend_rate: self.blend_rate,
            invert_y: self.invert_y,
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.url {
            Some(url) if !(url.starts_with("ws://") || url.starts_with("wss://")) => {
                return Err(invalid("client url must start with ws:// or wss://"));
            }
            None if self.origin.trim().is_empty() => {
                return Err(invalid("client origin cannot be empty"));
            }
            _ => {}
        }

        if self.plain_port == 0 || self.secure_port == 0 {
            return Err(invalid("plain_port and secure_port must be greater than 0"));
        }

        if self.reconnect_backoff_ms == 0 || self.reconnect_backoff_ms > 60000 {
            return Err(invalid("reconnect_backoff_ms must be between 1 and 60000"));
        }

        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > 60000 {
            return Err(invalid("connect_timeout_ms must be between 1 and 60000"));
        }

        if self.history_capacity == 0 || self.history_capacity > 100 {
            return Err(invalid("history_capacity must be between 1 and 100"));
        }

        if self.tick_ms == 0 || self.tick_ms > 1000 {
            return Err(invalid("tick_ms must be between 1 and 1000"));
        }

        if !self.blend_rate.is_finite() || self.blend_rate <= 0.0 || self.blend_rate > 1.0 {
            return Err(invalid("blend_rate must be between 0.0 (exclusive) and 1.0"));
        }

        if self.sensor_timeout_ms == 0 || self.sensor_timeout_ms > 60000 {
            return Err(invalid("sensor_timeout_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

impl MappingConfig {
    /// Config for a bare preset with no overrides.
    #[must_use]
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Applies the overrides on top of the preset and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if any axis or trigger is out of range.
    pub fn resolve(&self) -> Result<MappingProfile> {
        let base = self.preset.profile();
        let profile = MappingProfile {
            x: self.x.or(base.x),
            y: self.y.or(base.y),
            brake: self.brake.or(base.brake),
            speed: self.speed.or(base.speed),
            jump: self.jump.or(base.jump),
            shoot: self.shoot.or(base.shoot),
            action: self.action.or(base.action),
        };
        profile.validate()?;
        Ok(profile)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use motion_relay::config::Config;
    ///
    /// let config = Config::load("config/relay.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConfigParse`] on invalid TOML and
    /// [`RelayError::InvalidConfig`] when validation fails.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.hub.validate()?;
        self.client.validate()?;
        self.mapping.resolve()?;

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> RelayError {
    RelayError::InvalidConfig(message.to_string())
}
