//! Startup options for the tunnel agent
//!
//! Flags fall back to environment variables where the agent is usually
//! deployed as a node-local pod (`NODE_NAME`, `NODE_IP`).

use std::path::PathBuf;

use clap::Parser;

use et_core::config::{AgentConfig, CredentialSource};
use et_core::error::{ConfigError, ResolveError};
use et_core::identifier::{parse_identifiers, AgentIdentifiers};
use et_core::types::ListenerAddrs;

/// Default address of the plaintext tunnel listener
pub const DEFAULT_INSECURE_LISTEN_ADDR: &str = "127.0.0.1:10264";

/// Default address of the TLS tunnel listener
pub const DEFAULT_SECURE_LISTEN_ADDR: &str = "127.0.0.1:10263";

#[derive(Parser, Debug, Clone)]
#[command(name = "et-agent")]
#[command(about = "edge-tunnel agent - resolves agent identity and the port forwarding table")]
#[command(version)]
pub struct AgentOptions {
    /// The name of the edge node
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// The host IP of the edge node
    #[arg(long, env = "NODE_IP")]
    pub node_ip: Option<String>,

    /// The address of the tunnel server
    #[arg(long = "tunnelserver-addr")]
    pub tunnel_server_addr: Option<String>,

    /// A reachable address of the apiserver
    #[arg(long = "apiserver-addr")]
    pub apiserver_addr: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long = "kube-config")]
    pub kube_config: Option<PathBuf>,

    /// The identifiers of the agent, used by the server when choosing an agent
    /// (e.g. host=edge-1,ipv4=10.0.0.4)
    #[arg(long, default_value = "")]
    pub agent_identifiers: String,

    /// Configuration record file (TOML, or JSON with a .json extension)
    #[arg(long, env = "ET_CONFIG_RECORD")]
    pub config_record: Option<PathBuf>,

    /// Plaintext listener that insecure ports are forwarded to
    #[arg(long, default_value = DEFAULT_INSECURE_LISTEN_ADDR)]
    pub insecure_listen_addr: String,

    /// TLS listener that secure ports are forwarded to
    #[arg(long, default_value = DEFAULT_SECURE_LISTEN_ADDR)]
    pub secure_listen_addr: String,

    /// Seconds between configuration record reloads (0 disables reloading)
    #[arg(long, default_value_t = 0)]
    pub reload_interval: u64,

    /// Resolve the forwarding table, print it as JSON and exit
    #[arg(long)]
    pub print_table: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl AgentOptions {
    /// Check that required values are present and identifiers are well formed
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_name()?;
        self.node_ip()?;
        parse_identifiers(&self.agent_identifiers).map_err(ConfigError::InvalidIdentifiers)?;
        Ok(())
    }

    /// Build the agent configuration, filling in default identifiers
    pub fn config(&self) -> Result<AgentConfig, ConfigError> {
        let node_name = self.node_name()?;
        let node_ip = self.node_ip()?;

        let mut identifiers =
            parse_identifiers(&self.agent_identifiers).map_err(ConfigError::InvalidIdentifiers)?;
        if identifiers.is_empty() {
            identifiers = AgentIdentifiers::default_for(node_ip, node_name);
        }
        tracing::info!("{} is set for agent identifiers", identifiers);

        Ok(AgentConfig {
            node_name: node_name.to_string(),
            node_ip: node_ip.to_string(),
            tunnel_server_addr: self.tunnel_server_addr.clone(),
            identifiers,
            credentials: CredentialSource::select(
                self.kube_config.clone(),
                self.apiserver_addr.clone(),
            ),
        })
    }

    /// Listener addresses ports are forwarded to
    pub fn listeners(&self) -> Result<ListenerAddrs, ResolveError> {
        ListenerAddrs::new(
            self.insecure_listen_addr.as_str(),
            self.secure_listen_addr.as_str(),
        )
    }

    fn node_name(&self) -> Result<&str, ConfigError> {
        required(&self.node_name, "node-name", "NODE_NAME")
    }

    fn node_ip(&self) -> Result<&str, ConfigError> {
        required(&self.node_ip, "node-ip", "NODE_IP")
    }
}

fn required<'a>(
    value: &'a Option<String>,
    flag: &'static str,
    env: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { flag, env })
}
