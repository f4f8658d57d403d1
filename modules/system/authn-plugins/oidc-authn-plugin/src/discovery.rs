//! OIDC provider metadata discovery.

use serde::Deserialize;
use thiserror::Error;

const WELL_KNOWN: &str = "/.well-known/openid-configuration";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("fetching {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("issuer mismatch: configured {expected}, provider reports {actual}")]
    IssuerMismatch { expected: String, actual: String },
}

/// The subset of the discovery document this provider needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub jwks_uri: String,
}

/// Fetch `{issuer}/.well-known/openid-configuration` and check that the
/// document names the same issuer.
///
/// # Errors
/// Returns [`DiscoveryError`] on transport, status or decode failures and on
/// an issuer mismatch.
pub async fn discover(http: &reqwest::Client, issuer: &str) -> Result<ProviderMetadata, DiscoveryError> {
    let url = format!("{}{WELL_KNOWN}", issuer.trim_end_matches('/'));
    let fetch_err = |reason: String| DiscoveryError::Fetch {
        url: url.clone(),
        reason,
    };

    let metadata: ProviderMetadata = http
        .get(&url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| fetch_err(e.to_string()))?
        .json()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;

    if metadata.issuer != issuer {
        return Err(DiscoveryError::IssuerMismatch {
            expected: issuer.to_owned(),
            actual: metadata.issuer,
        });
    }
    tracing::debug!(issuer, jwks_uri = %metadata.jwks_uri, "discovered OIDC provider");
    Ok(metadata)
}
