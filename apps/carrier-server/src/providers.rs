//! The authentication providers this server ships with.
//!
//! Providers are registered before the command line is parsed, since their
//! flags are part of it. The cluster client they talk to needs the loaded
//! configuration, so it is attached later through [`ClusterBackends::connect`].

use std::sync::{Arc, OnceLock};

use anonymous_authn_plugin::AnonymousProvider;
use async_trait::async_trait;
use carrier_auth::{ProviderRegistry, RegistryError};
use carrier_http::ClusterClient;
use htpasswd_authn_plugin::{ClusterSecretStore, HtpasswdProvider, SecretData, SecretStore, SecretStoreError};
use oidc_authn_plugin::OidcProvider;
use token_authn_plugin::{HttpTokenReviewer, ReviewError, TokenProvider, TokenReviewStatus, TokenReviewer};

const NOT_CONNECTED: &str = "cluster client not connected";

/// Cluster-backed collaborators shared by the providers.
#[derive(Debug, Default)]
pub struct ClusterBackends {
    secrets: OnceLock<ClusterSecretStore>,
    reviews: OnceLock<HttpTokenReviewer>,
}

impl ClusterBackends {
    /// Attach the cluster client. Later calls are ignored.
    pub fn connect(&self, client: &ClusterClient) {
        if self.secrets.set(ClusterSecretStore::new(client.clone())).is_err()
            || self.reviews.set(HttpTokenReviewer::new(client.clone())).is_err()
        {
            tracing::warn!("cluster client already connected");
        }
    }
}

#[async_trait]
impl SecretStore for ClusterBackends {
    async fn get(&self, name: &str, namespace: &str) -> Result<SecretData, SecretStoreError> {
        let store = self
            .secrets
            .get()
            .ok_or_else(|| SecretStoreError::Unavailable(NOT_CONNECTED.to_owned()))?;
        store.get(name, namespace).await
    }
}

#[async_trait]
impl TokenReviewer for ClusterBackends {
    async fn review(&self, token: &str) -> Result<TokenReviewStatus, ReviewError> {
        let reviewer = self
            .reviews
            .get()
            .ok_or_else(|| ReviewError(NOT_CONNECTED.to_owned()))?;
        reviewer.review(token).await
    }
}

/// Register every built-in provider.
///
/// # Errors
/// Returns [`RegistryError`] if two providers share a name.
pub fn build_registry(backends: &Arc<ClusterBackends>) -> Result<ProviderRegistry, RegistryError> {
    Ok(ProviderRegistry::builder()
        .register(Arc::new(AnonymousProvider))?
        .register(Arc::new(HtpasswdProvider::new(Arc::clone(backends) as Arc<dyn SecretStore>)))?
        .register(Arc::new(OidcProvider::new()))?
        .register(Arc::new(TokenProvider::new(Arc::clone(backends) as Arc<dyn TokenReviewer>)))?
        .build())
}
