use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const IN_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";
const IN_CLUSTER_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const IN_CLUSTER_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Where the cluster API lives and how to authenticate against it.
///
/// Defaults match a pod's in-cluster service account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Base URL of the API server.
    pub server: String,

    /// File holding the bearer token sent with every request.
    pub token_file: Option<PathBuf>,

    /// PEM bundle trusted in addition to the system roots.
    pub ca_file: Option<PathBuf>,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            server: IN_CLUSTER_SERVER.to_owned(),
            token_file: Some(PathBuf::from(IN_CLUSTER_TOKEN)),
            ca_file: Some(PathBuf::from(IN_CLUSTER_CA)),
            timeout_secs: 10,
        }
    }
}

impl ClusterConfig {
    /// Plain config for a server that needs neither token nor extra CA.
    #[must_use]
    pub fn for_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token_file: None,
            ca_file: None,
            ..Self::default()
        }
    }
}
