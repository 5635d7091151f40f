//! # Container Model
//!
//! The read-only view of a container that port resolution works on, plus the
//! query and outcome types exchanged with callers.
//!
//! A port is written `<number>` or `<number>/<protocol>`; a bare number means
//! `tcp`. The same notation is used on the wire and by the container runtime
//! for its port keys, so both sides parse through [`PortQuery`].

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{InventoryError, ValidationError};

/// Wire value signalling that the container exists but the port is not published.
pub const NOT_EXPOSED: u16 = 0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(ValidationError::InvalidProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// A logical (container-internal) port together with its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortQuery {
    pub number: u16,
    pub protocol: Protocol,
}

impl PortQuery {
    pub fn new(number: u16, protocol: Protocol) -> Self {
        Self { number, protocol }
    }

    pub fn tcp(number: u16) -> Self {
        Self::new(number, Protocol::Tcp)
    }

    pub fn udp(number: u16) -> Self {
        Self::new(number, Protocol::Udp)
    }
}

impl FromStr for PortQuery {
    type Err = ValidationError;

    /// Parses `"80"`, `"80/tcp"` or `"8125/udp"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (number, protocol) = match trimmed.split_once('/') {
            Some((number, protocol)) => (number, protocol.parse()?),
            None => (trimmed, Protocol::Tcp),
        };
        let number: u16 = number
            .parse()
            .map_err(|_| ValidationError::InvalidPort(s.to_string()))?;
        if number == 0 {
            return Err(ValidationError::InvalidPort(s.to_string()));
        }
        Ok(Self { number, protocol })
    }
}

impl fmt::Display for PortQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

/// Snapshot of one container as reported by the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRecord {
    pub hostname: String,
    pub ip: String,
    pub mac: String,
    /// Logical port to host-exposed port. Keys always carry a protocol.
    pub ports: HashMap<PortQuery, u16>,
}

impl ContainerRecord {
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
            mac: mac.into(),
            ports: HashMap::new(),
        }
    }

    pub fn with_port(mut self, port: PortQuery, host_port: u16) -> Self {
        self.ports.insert(port, host_port);
        self
    }

    pub fn host_port(&self, port: &PortQuery) -> Option<u16> {
        self.ports.get(port).copied()
    }

    pub fn matches_triple(&self, hostname: &str, ip: &str, mac: &str) -> bool {
        self.hostname == hostname && self.ip == ip && self.mac == mac
    }

    pub fn matches_ip(&self, ip: IpAddr) -> bool {
        self.ip
            .parse::<IpAddr>()
            .is_ok_and(|own| own.to_canonical() == ip.to_canonical())
    }
}

/// Who is asking. Selects the matching strategy of the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityQuery {
    /// Identity declared by a remote caller in the request body.
    ByHostnameAndTriple {
        hostname: String,
        ip: String,
        mac: String,
    },
    /// Identity taken from the transport-layer peer address.
    BySourceIp { ip: IpAddr },
}

impl fmt::Display for IdentityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityQuery::ByHostnameAndTriple { hostname, ip, mac } => {
                write!(f, "{hostname} ({ip}, {mac})")
            }
            IdentityQuery::BySourceIp { ip } => write!(f, "source {ip}"),
        }
    }
}

/// Outcome of one port resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The logical port is published on this host port.
    Resolved(u16),
    /// The container exists but does not publish the port.
    NotExposed,
    /// No container matches the identity.
    NotFound,
    /// The inventory could not be read.
    Failed(InventoryError),
}

impl Resolution {
    /// The integer sent to callers for successful outcomes; `None` for outcomes
    /// that travel as protocol-level errors.
    pub fn wire_value(&self) -> Option<u16> {
        match self {
            Resolution::Resolved(port) => Some(*port),
            Resolution::NotExposed => Some(NOT_EXPOSED),
            Resolution::NotFound | Resolution::Failed(_) => None,
        }
    }

    /// Inverse of [`Resolution::wire_value`]. Non-positive values are treated as
    /// the not-exposed sentinel, which also covers servers answering `-1`.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            v if v <= 0 => Some(Resolution::NotExposed),
            v => u16::try_from(v).ok().map(Resolution::Resolved),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved(port) => write!(f, "resolved to {port}"),
            Resolution::NotExposed => f.write_str("not exposed"),
            Resolution::NotFound => f.write_str("not found"),
            Resolution::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}
