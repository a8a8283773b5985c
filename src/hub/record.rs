//! Per-connection bookkeeping for the relay hub.

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};

use crate::protocol::{Register, Role};

/// Hub-assigned connection identifier, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What the hub knows about one open connection.
///
/// A connection is *registered* once it has sent `register` with a name;
/// only registered connections take part in `join`/`leave` presence.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub connected_at: DateTime<Utc>,
    pub role: Role,
    pub name: Option<String>,
    pub device_id: Option<String>,
    pub game_type: Option<String>,
    pub capabilities: Vec<String>,
}

impl ConnectionRecord {
    #[must_use]
    pub fn new(id: ConnectionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            connected_at: Utc::now(),
            role: Role::Unknown,
            name: None,
            device_id: None,
            game_type: None,
            capabilities: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }

    /// Applies a `register` message and returns the announced name, if any.
    ///
    /// An explicit role replaces the current one; otherwise the role is kept.
    /// A registration without a name keeps any name given earlier.
    pub fn register(&mut self, register: &Register) -> Option<&str> {
        if let Some(role) = register.role {
            self.role = role;
        }
        self.device_id = Some(register.device_id.clone());
        self.game_type = register.game_type.clone();
        self.capabilities = register.capabilities.clone().unwrap_or_default();
        let name = register.announced_name()?;
        Some(self.name.insert(name.to_string()).as_str())
    }

    /// Marks a connection that streams sensor data without declaring a role.
    pub fn observe_sensor_data(&mut self) {
        if self.role == Role::Unknown {
            self.role = Role::Sensor;
        }
    }

    /// Name used in logs: the registered name or the connection id.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.id),
            None => self.id.to_string(),
        }
    }
}
