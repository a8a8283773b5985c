//! Connection status and presence events surfaced to the game.

use std::fmt;

use crate::protocol::Presence;

/// Lifecycle of a [`ConnectionClient`](super::ConnectionClient).
///
/// ```text
/// Disconnected ──► Connecting ──► Live
///                     ▲            │ close / error
///                     │            ▼
///                     └──────── Simulated
/// ```
///
/// `Closed` is terminal and only reached through shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Live,
    Simulated,
    Closed,
}

impl ConnectionStatus {
    #[must_use]
    pub fn is_live(self) -> bool {
        self == ConnectionStatus::Live
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Live => "live",
            ConnectionStatus::Simulated => "simulated",
            ConnectionStatus::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Another participant joined or left the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Joined(Presence),
    Left(Presence),
}

impl PeerEvent {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            PeerEvent::Joined(presence) | PeerEvent::Left(presence) => &presence.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_only_live_is_live() {
        assert!(ConnectionStatus::Live.is_live());
        for status in [
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Simulated,
            ConnectionStatus::Closed,
        ] {
            assert!(!status.is_live(), "{}", status);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionStatus::Simulated.to_string(), "simulated");
        assert_eq!(ConnectionStatus::Live.to_string(), "live");
    }

    #[test]
    fn test_peer_event_name() {
        let event = PeerEvent::Left(Presence::now("alice"));
        assert_eq!(event.name(), "alice");
    }
}
