//! Agent identifiers
//!
//! An agent tags itself with `type=value` pairs so the tunnel server can pick
//! the right agent for a request. Several pairs are joined with `,`, e.g.
//! `host=edge-1,ipv4=10.0.0.4`. The set of types is closed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Kind of an agent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    /// Node host name
    Host,
    /// Network range served by the agent
    Cidr,
    /// IPv4 address of the node
    Ipv4,
    /// IPv6 address of the node
    Ipv6,
    /// Opaque unique id
    Uid,
}

impl IdentifierType {
    /// All recognised identifier types
    pub const ALL: [IdentifierType; 5] = [
        IdentifierType::Host,
        IdentifierType::Cidr,
        IdentifierType::Ipv4,
        IdentifierType::Ipv6,
        IdentifierType::Uid,
    ];

    /// Wire spelling understood by the tunnel server
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Host => "host",
            IdentifierType::Cidr => "cidr",
            IdentifierType::Ipv4 => "ipv4",
            IdentifierType::Ipv6 => "ipv6",
            IdentifierType::Uid => "uid",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierType {
    type Err = IdentifierError;

    // Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IdentifierError::UnknownType(s.to_string()))
    }
}

/// A single `type=value` identifier entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentifier {
    pub kind: IdentifierType,
    pub value: String,
}

impl AgentIdentifier {
    /// Create a new identifier entry
    pub fn new(kind: IdentifierType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for AgentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

impl FromStr for AgentIdentifier {
    type Err = IdentifierError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = entry.split('=').collect();
        let [kind, value] = parts.as_slice() else {
            return Err(IdentifierError::MalformedEntry(entry.to_string()));
        };

        Ok(Self::new(kind.parse()?, *value))
    }
}

/// Ordered set of identifiers an agent announces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentifiers(Vec<AgentIdentifier>);

impl AgentIdentifiers {
    /// Identifiers used when the operator supplied none
    pub fn default_for(node_ip: &str, node_name: &str) -> Self {
        Self(vec![
            AgentIdentifier::new(IdentifierType::Ipv4, node_ip),
            AgentIdentifier::new(IdentifierType::Host, node_name),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentIdentifier> {
        self.0.iter()
    }

    /// Values recorded for a given identifier type
    pub fn values_of(&self, kind: IdentifierType) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |id| id.kind == kind)
            .map(|id| id.value.as_str())
    }
}

impl fmt::Display for AgentIdentifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

impl FromStr for AgentIdentifiers {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_identifiers(s)
    }
}

/// Parse an identifiers string into typed entries.
///
/// An empty string yields an empty set; the caller fills in defaults later.
pub fn parse_identifiers(identifiers: &str) -> Result<AgentIdentifiers, IdentifierError> {
    if identifiers.is_empty() {
        return Ok(AgentIdentifiers::default());
    }

    identifiers
        .split(',')
        .map(str::parse)
        .collect::<Result<Vec<_>, _>>()
        .map(AgentIdentifiers)
}

/// Check whether an identifiers string is well formed
pub fn validate_identifiers(identifiers: &str) -> bool {
    parse_identifiers(identifiers).is_ok()
}
