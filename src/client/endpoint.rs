//! # Hub Endpoint Selection
//!
//! Derives the hub URL from the page origin the game is served from:
//!
//! | Origin scheme | Hub URL |
//! |---------------|---------|
//! | `http://host[:port]` | `ws://host:<plain_port>` |
//! | `https://host[:port]` | `wss://host:<secure_port>` |
//!
//! The origin's own port is ignored; the hub always listens on its own ports.

use std::fmt;

use crate::config::ClientConfig;
use crate::error::{RelayError, Result};

/// Resolved WebSocket URL of the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    secure: bool,
}

impl Endpoint {
    /// Derives the endpoint from a page origin.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] for an unsupported scheme or an
    /// empty host.
    ///
    /// # Examples
    ///
    /// ```
    /// use motion_relay::client::Endpoint;
    ///
    /// let endpoint = Endpoint::from_origin("https://game.example.com:3000", 8080, 8443)?;
    /// assert_eq!(endpoint.url(), "wss://game.example.com:8443");
    /// assert!(endpoint.is_secure());
    /// # Ok::<(), motion_relay::error::RelayError>(())
    /// ```
    pub fn from_origin(origin: &str, plain_port: u16, secure_port: u16) -> Result<Self> {
        let origin = origin.trim();
        let (scheme, rest) = origin
            .split_once("://")
            .ok_or_else(|| RelayError::InvalidConfig(format!("origin '{}' has no scheme", origin)))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "http" | "ws" => false,
            "https" | "wss" => true,
            other => {
                return Err(RelayError::InvalidConfig(format!(
                    "unsupported origin scheme '{}'",
                    other
                )))
            }
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or_default();
        let host = strip_port(authority);
        if host.is_empty() {
            return Err(RelayError::InvalidConfig(format!("origin '{}' has no host", origin)));
        }

        let (ws_scheme, port) = if secure {
            ("wss", secure_port)
        } else {
            ("ws", plain_port)
        };

        Ok(Self {
            url: format!("{}://{}:{}", ws_scheme, host, port),
            secure,
        })
    }

    /// Uses an explicit URL as-is.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] unless the URL is `ws://` or `wss://`.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        let secure = if url.starts_with("wss://") {
            true
        } else if url.starts_with("ws://") {
            false
        } else {
            return Err(RelayError::InvalidConfig(format!(
                "hub url '{}' must start with ws:// or wss://",
                url
            )));
        };
        Ok(Self {
            url: url.to_string(),
            secure,
        })
    }

    /// Explicit `url` when configured, otherwise derived from `origin`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`from_url`](Self::from_url) or
    /// [`from_origin`](Self::from_origin).
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        match &config.url {
            Some(url) => Self::from_url(url),
            None => Self::from_origin(&config.origin, config.plain_port, config.secure_port),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Removes a trailing `:port`, keeping bracketed IPv6 hosts intact.
fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.rsplit_once(':') {
        Some((host, _)) => host,
        None => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_origin() {
        let endpoint = Endpoint::from_origin("http://localhost", 8080, 8443).unwrap();
        assert_eq!(endpoint.url(), "ws://localhost:8080");
        assert!(!endpoint.is_secure());
    }

    #[test]
    fn test_secure_origin() {
        let endpoint = Endpoint::from_origin("https://games.local", 8080, 8443).unwrap();
        assert_eq!(endpoint.url(), "wss://games.local:8443");
        assert!(endpoint.is_secure());
    }

    #[test]
    fn test_origin_port_and_path_ignored() {
        let endpoint = Endpoint::from_origin("http://192.168.1.20:5173/maze/index.html?x=1", 9000, 9443).unwrap();
        assert_eq!(endpoint.url(), "ws://192.168.1.20:9000");
    }

    #[test]
    fn test_ipv6_origin() {
        let endpoint = Endpoint::from_origin("https://[::1]:3000", 8080, 8443).unwrap();
        assert_eq!(endpoint.url(), "wss://[::1]:8443");
    }

    #[test]
    fn test_userinfo_stripped() {
        let endpoint = Endpoint::from_origin("http://user:pw@host.lan:81", 8080, 8443).unwrap();
        assert_eq!(endpoint.url(), "ws://host.lan:8080");
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let endpoint = Endpoint::from_origin("HTTPS://Example.com", 1, 2).unwrap();
        assert_eq!(endpoint.url(), "wss://Example.com:2");
    }

    #[test]
    fn test_invalid_origins() {
        for origin in ["localhost", "ftp://files.local", "http://", "https://:443"] {
            assert!(
                matches!(Endpoint::from_origin(origin, 8080, 8443), Err(RelayError::InvalidConfig(_))),
                "{} should be rejected",
                origin
            );
        }
    }

    #[test]
    fn test_from_url() {
        assert!(Endpoint::from_url("wss://relay:8443/path").unwrap().is_secure());
        assert!(!Endpoint::from_url("ws://relay:8080").unwrap().is_secure());
        assert!(Endpoint::from_url("http://relay").is_err());
    }

    #[test]
    fn test_from_config_prefers_url() {
        let mut config = ClientConfig::default();
        assert_eq!(Endpoint::from_config(&config).unwrap().url(), "ws://localhost:8080");

        config.url = Some("ws://10.0.0.5:7000".to_string());
        assert_eq!(Endpoint::from_config(&config).unwrap().url(), "ws://10.0.0.5:7000");
    }
}
