//! # Error Types
//!
//! Custom error types for Motion Relay using `thiserror`.

use thiserror::Error;

/// Main error type for Motion Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection refused, dropped or timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration value out of range (fatal at construction)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// TLS setup errors
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Motion Relay
pub type Result<T> = std::result::Result<T, RelayError>;
