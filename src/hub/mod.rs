//! # Relay Hub Module
//!
//! Tracks open connections and fans inbound frames out to the rest of the
//! population.
//!
//! This module handles:
//! - Connection records with optional registration ([`record`])
//! - The registry and routing rules ([`RelayHub`])
//! - Listening sockets and per-connection tasks ([`server`])
//!
//! ## Routing Rules
//!
//! | Inbound | Sent to | Content |
//! |---------|---------|---------|
//! | `register` with a `name` | every other *registered* connection | `join {name, timestamp}` |
//! | `sensor_data` | every other connection | the inbound text, unmodified |
//! | close of a registered connection | every remaining *registered* connection | `leave {name, timestamp}` |
//! | anything else | nobody | logged and dropped |
//!
//! [`RelayHub`] itself never awaits. Each connection owns a bounded outbound
//! queue drained by its writer task, so a slow recipient only loses its own
//! frames. Frames from one sender reach a given recipient in the order the
//! hub handled them.

pub mod record;
pub mod server;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::protocol::{encode, parse_hub_inbound, HubInbound, HubOutbound, Presence};
pub use record::{ConnectionId, ConnectionRecord};
pub use server::HubServer;

/// Queue feeding one connection's writer task.
pub type Outbound = mpsc::Sender<Arc<str>>;

/// Which connections a broadcast reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Registered,
}

/// What the hub did with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// `register` accepted; `join` queued for `notified` connections.
    /// Without a name nobody is notified.
    Registered { name: Option<String>, notified: usize },
    /// `sensor_data` queued for `recipients` connections.
    Relayed { recipients: usize },
    /// Malformed, unknown, or from an untracked connection.
    Ignored,
}

/// Point-in-time view of the tracked connections.
#[derive(Debug, Clone, PartialEq)]
pub struct HubSnapshot {
    pub connections: Vec<ConnectionRecord>,
}

impl HubSnapshot {
    #[must_use]
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Writes the snapshot to the operator log.
    pub fn log(&self) {
        info!("Hub snapshot: {} connection(s)", self.count());
        for record in &self.connections {
            info!(
                "  {} name={} role={} addr={} since={}",
                record.id,
                record.name.as_deref().unwrap_or("-"),
                record.role,
                record.addr,
                record.connected_at.to_rfc3339()
            );
        }
    }
}

struct Peer {
    record: ConnectionRecord,
    tx: Outbound,
}

/// Connection registry and router.
///
/// # Examples
///
/// ```
/// use tokio::sync::mpsc;
/// use motion_relay::hub::{MessageOutcome, RelayHub};
///
/// let mut hub = RelayHub::new();
/// let (a_tx, _a_rx) = mpsc::channel(8);
/// let (b_tx, mut b_rx) = mpsc::channel(8);
/// let a = hub.accept("127.0.0.1:40001".parse().unwrap(), a_tx);
/// hub.accept("127.0.0.1:40002".parse().unwrap(), b_tx);
///
/// let frame = r#"{"type":"sensor_data","data":{"orientation":{"alpha":0,"beta":10,"gamma":0}}}"#;
/// assert_eq!(hub.on_message(a, frame), MessageOutcome::Relayed { recipients: 1 });
/// assert_eq!(&*b_rx.try_recv().unwrap(), frame);
/// ```
#[derive(Default)]
pub struct RelayHub {
    next_id: u64,
    peers: HashMap<ConnectionId, Peer>,
}

impl RelayHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a connection whose writer drains `tx`.
    pub fn accept(&mut self, addr: SocketAddr, tx: Outbound) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        self.peers.insert(
            id,
            Peer {
                record: ConnectionRecord::new(id, addr),
                tx,
            },
        );
        info!("Connection {} accepted from {} ({} open)", id, addr, self.peers.len());
        id
    }

    /// Handles one inbound text frame. Never fails; bad input is logged.
    pub fn on_message(&mut self, id: ConnectionId, raw: &str) -> MessageOutcome {
        let Some(peer) = self.peers.get_mut(&id) else {
            debug!("Frame from untracked connection {}", id);
            return MessageOutcome::Ignored;
        };

        let message = match parse_hub_inbound(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping frame from {}: {}", peer.record.label(), e);
                return MessageOutcome::Ignored;
            }
        };

        match message {
            HubInbound::Register(register) => {
                let Some(name) = peer.record.register(&register).map(str::to_string) else {
                    info!(
                        "Connection {} registered device {} without a name (role {})",
                        id, register.device_id, peer.record.role
                    );
                    return MessageOutcome::Registered {
                        name: None,
                        notified: 0,
                    };
                };
                info!(
                    "Connection {} registered as '{}' (role {})",
                    id, name, peer.record.role
                );
                let notified = self.broadcast_presence(HubOutbound::Join(Presence::now(&name)), id);
                MessageOutcome::Registered {
                    name: Some(name),
                    notified,
                }
            }
            HubInbound::SensorData { .. } => {
                peer.record.observe_sensor_data();
                let recipients = self.broadcast_to(Audience::Everyone, Arc::from(raw), Some(id));
                debug!("Relayed sensor_data from {} to {} connection(s)", id, recipients);
                MessageOutcome::Relayed { recipients }
            }
            HubInbound::Unknown => {
                warn!("Ignoring frame with unknown type from {}", peer.record.label());
                MessageOutcome::Ignored
            }
        }
    }

    /// Queues `frame` for every connection except `exclude`.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(&self, frame: &str, exclude: Option<ConnectionId>) -> usize {
        self.broadcast_to(Audience::Everyone, Arc::from(frame), exclude)
    }

    /// Queues `frame` for the chosen audience, skipping closed connections.
    ///
    /// A full or closed queue only costs that recipient its copy.
    pub fn broadcast_to(&self, audience: Audience, frame: Arc<str>, exclude: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        for (id, peer) in &self.peers {
            if Some(*id) == exclude {
                continue;
            }
            if audience == Audience::Registered && !peer.record.is_registered() {
                continue;
            }
            match peer.tx.try_send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Outbound queue full for {}, dropping frame", peer.record.label());
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Skipping closed connection {}", id);
                }
            }
        }
        delivered
    }

    /// Stops tracking `id` and announces `leave` if it had registered.
    ///
    /// Dropping the stored queue sender lets the writer task close the socket.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<ConnectionRecord> {
        let peer = self.peers.remove(&id)?;
        info!(
            "Connection {} closed ({} open)",
            peer.record.label(),
            self.peers.len()
        );
        if let Some(name) = &peer.record.name {
            self.broadcast_presence(HubOutbound::Leave(Presence::now(name)), id);
        }
        Some(peer.record)
    }

    #[must_use]
    pub fn snapshot(&self) -> HubSnapshot {
        let mut connections: Vec<ConnectionRecord> =
            self.peers.values().map(|peer| peer.record.clone()).collect();
        connections.sort_by_key(|record| record.id);
        HubSnapshot { connections }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    #[must_use]
    pub fn record(&self, id: ConnectionId) -> Option<&ConnectionRecord> {
        self.peers.get(&id).map(|peer| &peer.record)
    }

    /// Drops every connection without presence notifications.
    pub fn shutdown(&mut self) -> usize {
        let closed = self.peers.len();
        self.peers.clear();
        info!("Hub shut down, closed {} connection(s)", closed);
        closed
    }

    fn broadcast_presence(&self, message: HubOutbound, exclude: ConnectionId) -> usize {
        match encode(&message) {
            Ok(text) => self.broadcast_to(Audience::Registered, Arc::from(text), Some(exclude)),
            Err(e) => {
                warn!("Failed to encode presence frame: {}", e);
                0
            }
        }
    }
}
