//! et-core: Configuration resolution for the edge-tunnel agent
//!
//! This crate turns raw startup values into the two things the agent needs
//! before it can dial the tunnel server: a validated set of agent
//! identifiers and the port forwarding table consumed by the dialer.

pub mod config;
pub mod error;
pub mod identifier;
pub mod ports;
pub mod types;

pub use config::{AgentConfig, ConfigRecord, CredentialSource};
pub use error::{ConfigError, EtError, IdentifierError, ResolveError};
pub use identifier::{validate_identifiers, AgentIdentifier, AgentIdentifiers, IdentifierType};
pub use ports::resolve_proxy_ports;
pub use types::{ListenerAddrs, PortForwardingTable};
