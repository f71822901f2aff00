//! Core error types for edge-tunnel

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the edge-tunnel agent
#[derive(Error, Debug)]
pub enum EtError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Port resolution error
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required startup value is absent from both flag and environment
    #[error("either --{flag} or ${env} has to be set")]
    Missing {
        flag: &'static str,
        env: &'static str,
    },

    /// Agent identifiers do not match the `type=value` grammar
    #[error("--agent-identifiers are invalid, format should be host={{node-name}}: {0}")]
    InvalidIdentifiers(#[source] IdentifierError),

    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while parsing agent identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Entry does not split into exactly `type=value`
    #[error("malformed identifier entry '{0}', expected type=value")]
    MalformedEntry(String),

    /// Type is not one of the recognised identifier types
    #[error("unknown identifier type '{0}'")]
    UnknownType(String),
}

/// Errors produced while resolving the port forwarding table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A configured value does not match its grammar
    #[error("invalid {key} entry '{entry}': {reason}")]
    Format {
        key: &'static str,
        entry: String,
        reason: String,
    },

    /// A dnat target port matches neither listener
    #[error("dnat target port {target} for source port {source_port} matches neither listener ({insecure}, {secure})")]
    UnresolvedTarget {
        source_port: u16,
        target: u16,
        insecure: String,
        secure: String,
    },

    /// The same source port is configured with two different destinations
    #[error("source port {port} maps to both {existing} and {requested}")]
    ConflictingMapping {
        port: u16,
        existing: String,
        requested: String,
    },

    /// A listener address has no usable port component
    #[error("invalid listener address '{addr}': {reason}")]
    InvalidListener { addr: String, reason: String },
}
