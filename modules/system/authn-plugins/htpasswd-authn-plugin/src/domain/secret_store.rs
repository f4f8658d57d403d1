//! Access to the cluster secret that holds the htpasswd file.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use carrier_http::{ClusterClient, ClusterError};
use serde::Deserialize;
use thiserror::Error;

/// Decoded secret payload, key to raw bytes.
pub type SecretData = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret {namespace}/{name} not found")]
    NotFound { name: String, namespace: String },

    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed secret: {0}")]
    Malformed(String),
}

/// Read-only key/value secret lookup.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the data of secret `namespace/name`.
    ///
    /// # Errors
    /// See [`SecretStoreError`].
    async fn get(&self, name: &str, namespace: &str) -> Result<SecretData, SecretStoreError>;
}

#[derive(Deserialize)]
struct SecretObject {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

/// Secrets read from the cluster API (`/api/v1/namespaces/{ns}/secrets/{name}`).
#[derive(Debug, Clone)]
pub struct ClusterSecretStore {
    client: ClusterClient,
}

impl ClusterSecretStore {
    #[must_use]
    pub fn new(client: ClusterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for ClusterSecretStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<SecretData, SecretStoreError> {
        let path = format!("/api/v1/namespaces/{namespace}/secrets/{name}");
        let object: SecretObject = self.client.get_json(&path).await.map_err(|e| match e {
            ClusterError::NotFound => SecretStoreError::NotFound {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            },
            ClusterError::Decode(msg) => SecretStoreError::Malformed(msg),
            other => SecretStoreError::Unavailable(other.to_string()),
        })?;

        object
            .data
            .into_iter()
            .map(|(key, value)| {
                STANDARD
                    .decode(value)
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| SecretStoreError::Malformed(format!("key {key}: {e}")))
            })
            .collect()
    }
}

/// In-memory secrets keyed by `(namespace, name)`.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<(String, String), SecretData>,
}

impl StaticSecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        data: SecretData,
    ) -> Self {
        self.secrets.insert((namespace.into(), name.into()), data);
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<SecretData, SecretStoreError> {
        self.secrets
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            })
    }
}
