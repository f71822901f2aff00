//! Core domain types

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::ResolveError;

/// The two ingress listeners an agent can forward to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerAddrs {
    insecure: String,
    insecure_port: u16,
    secure: String,
    secure_port: u16,
}

impl ListenerAddrs {
    /// Create listener addresses from `host:port` strings
    pub fn new(insecure: impl Into<String>, secure: impl Into<String>) -> Result<Self, ResolveError> {
        let insecure = insecure.into();
        let secure = secure.into();
        let insecure_port = parse_port_component(&insecure)?;
        let secure_port = parse_port_component(&secure)?;

        Ok(Self {
            insecure,
            insecure_port,
            secure,
            secure_port,
        })
    }

    /// Plaintext listener address
    pub fn insecure(&self) -> &str {
        &self.insecure
    }

    /// TLS listener address
    pub fn secure(&self) -> &str {
        &self.secure
    }

    /// Listener address whose port equals `port`, insecure first
    pub fn by_port(&self, port: u16) -> Option<&str> {
        if port == self.insecure_port {
            Some(&self.insecure)
        } else if port == self.secure_port {
            Some(&self.secure)
        } else {
            None
        }
    }
}

/// Extract the port of a `host:port` address
fn parse_port_component(addr: &str) -> Result<u16, ResolveError> {
    let invalid = |reason: String| ResolveError::InvalidListener {
        addr: addr.to_string(),
        reason,
    };

    let (_, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port".to_string()))?;

    port.parse::<u16>()
        .map_err(|e| invalid(format!("invalid port '{}': {}", port, e)))
}

/// Source port to listener address mapping consumed by the tunnel dialer.
///
/// Ports keep insertion order; each port appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortForwardingTable {
    ports: Vec<u16>,
    mappings: HashMap<u16, String>,
}

impl PortForwardingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `port` to `destination`.
    ///
    /// Re-inserting a port with the same destination is a no-op; a different
    /// destination is rejected.
    pub fn insert(&mut self, port: u16, destination: &str) -> Result<(), ResolveError> {
        match self.mappings.get(&port) {
            Some(existing) if existing == destination => Ok(()),
            Some(existing) => Err(ResolveError::ConflictingMapping {
                port,
                existing: existing.clone(),
                requested: destination.to_string(),
            }),
            None => {
                self.ports.push(port);
                self.mappings.insert(port, destination.to_string());
                Ok(())
            }
        }
    }

    /// Map `port` to `destination`, replacing any earlier destination.
    ///
    /// A replaced port keeps its original position.
    pub fn overwrite(&mut self, port: u16, destination: &str) {
        if self
            .mappings
            .insert(port, destination.to_string())
            .is_none()
        {
            self.ports.push(port);
        }
    }

    /// Insert every entry of `other`, in order, with the checks of [`insert`](Self::insert)
    pub fn merge(&mut self, other: &PortForwardingTable) -> Result<(), ResolveError> {
        for (port, destination) in other.iter() {
            self.insert(port, destination)?;
        }
        Ok(())
    }

    /// Source ports in insertion order
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Full port to destination mapping
    pub fn mappings(&self) -> &HashMap<u16, String> {
        &self.mappings
    }

    /// Destination for a source port
    pub fn destination(&self, port: u16) -> Option<&str> {
        self.mappings.get(&port).map(String::as_str)
    }

    /// Iterate `(port, destination)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.ports
            .iter()
            .filter_map(|port| self.destination(*port).map(|dst| (*port, dst)))
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl fmt::Display for PortForwardingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (port, dst)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}->{}", port, dst)?;
        }
        Ok(())
    }
}
