//! Agent configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::identifier::AgentIdentifiers;

/// Kubeconfig used when neither a kubeconfig nor an API server address is given
pub const DEFAULT_KUBECONFIG: &str = "/etc/kubernetes/kubelet.conf";

/// Where the agent takes its cluster credentials from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Path to a kubeconfig file
    KubeConfig(PathBuf),
    /// API server address combined with in-cluster credentials
    ApiServer(String),
}

impl CredentialSource {
    /// Pick the credential source from the optional flag values.
    ///
    /// A kubeconfig wins over an API server address; with neither the
    /// kubelet kubeconfig is used.
    pub fn select(kube_config: Option<PathBuf>, apiserver_addr: Option<String>) -> Self {
        match (kube_config, apiserver_addr) {
            (Some(path), _) => CredentialSource::KubeConfig(path),
            (None, Some(addr)) => CredentialSource::ApiServer(addr),
            (None, None) => {
                tracing::info!(
                    "neither --kube-config nor --apiserver-addr is set, will use {} as the kubeconfig",
                    DEFAULT_KUBECONFIG
                );
                CredentialSource::KubeConfig(PathBuf::from(DEFAULT_KUBECONFIG))
            }
        }
    }
}

/// Validated startup configuration for the tunnel agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name of the edge node
    pub node_name: String,

    /// Host IP of the edge node
    pub node_ip: String,

    /// Tunnel server address
    pub tunnel_server_addr: Option<String>,

    /// Identifiers announced to the tunnel server
    pub identifiers: AgentIdentifiers,

    /// Cluster credential source
    pub credentials: CredentialSource,
}
