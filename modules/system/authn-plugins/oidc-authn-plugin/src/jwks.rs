//! Signing key cache.
//!
//! Keys are fetched once during init and refreshed only when a token names a
//! key id the cache does not know, at most once per refresh interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use jsonwebtoken::jwk::JwkSet;
use parking_lot::Mutex;
use thiserror::Error;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
#[error("fetching signing keys from {url}: {reason}")]
pub struct KeyFetchError {
    pub url: String,
    pub reason: String,
}

pub struct KeyCache {
    http: reqwest::Client,
    jwks_uri: String,
    keys: ArcSwap<JwkSet>,
    last_refresh: Mutex<Option<Instant>>,
    refresh_interval: Duration,
}

impl KeyCache {
    /// Fetch the key set at `jwks_uri` and build a cache around it.
    ///
    /// # Errors
    /// Returns [`KeyFetchError`] if the initial fetch fails.
    pub async fn load(http: reqwest::Client, jwks_uri: String) -> Result<Self, KeyFetchError> {
        let keys = fetch(&http, &jwks_uri).await?;
        tracing::info!(jwks_uri = %jwks_uri, keys = keys.keys.len(), "loaded OIDC signing keys");
        Ok(Self {
            http,
            jwks_uri,
            keys: ArcSwap::from_pointee(keys),
            last_refresh: Mutex::new(Some(Instant::now())),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        })
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// The current key set.
    #[must_use]
    pub fn keys(&self) -> Arc<JwkSet> {
        self.keys.load_full()
    }

    /// Refetch the key set unless the last refresh is too recent.
    ///
    /// Returns `Ok(None)` when the refresh was skipped.
    ///
    /// # Errors
    /// Returns [`KeyFetchError`] if the fetch fails; the old keys stay in place.
    pub async fn refresh(&self) -> Result<Option<Arc<JwkSet>>, KeyFetchError> {
        {
            let mut last = self.last_refresh.lock();
            let now = Instant::now();
            if last.is_some_and(|at| now.duration_since(at) < self.refresh_interval) {
                return Ok(None);
            }
            *last = Some(now);
        }

        let keys = Arc::new(fetch(&self.http, &self.jwks_uri).await?);
        self.keys.store(Arc::clone(&keys));
        tracing::info!(jwks_uri = %self.jwks_uri, keys = keys.keys.len(), "refreshed OIDC signing keys");
        Ok(Some(keys))
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache")
            .field("jwks_uri", &self.jwks_uri)
            .field("keys", &self.keys.load().keys.len())
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<JwkSet, KeyFetchError> {
    let err = |reason: String| KeyFetchError {
        url: url.to_owned(),
        reason,
    };
    http.get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| err(e.to_string()))?
        .json::<JwkSet>()
        .await
        .map_err(|e| err(e.to_string()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn jwks(kid: &str) -> serde_json::Value {
        json!({"keys": [{
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
            "e": "AQAB"
        }]})
    }

    #[tokio::test]
    async fn refresh_is_rate_limited() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/keys");
                then.status(200).json_body(jwks("k1"));
            })
            .await;

        let cache = KeyCache::load(reqwest::Client::new(), server.url("/keys"))
            .await
            .unwrap()
            .with_refresh_interval(Duration::from_secs(3600));

        assert!(cache.refresh().await.unwrap().is_none());
        mock.assert_async().await;
        assert!(cache.keys().find("k1").is_some());
    }

    #[tokio::test]
    async fn refresh_replaces_keys_when_allowed() {
        let server = MockServer::start_async().await;
        let mut first = server
            .mock_async(|when, then| {
                when.method(GET).path("/keys");
                then.status(200).json_body(jwks("old"));
            })
            .await;

        let cache = KeyCache::load(reqwest::Client::new(), server.url("/keys"))
            .await
            .unwrap()
            .with_refresh_interval(Duration::ZERO);
        first.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/keys");
                then.status(200).json_body(jwks("new"));
            })
            .await;

        let refreshed = cache.refresh().await.unwrap().unwrap();
        assert!(refreshed.find("new").is_some());
        assert!(cache.keys().find("old").is_none());
    }

    #[tokio::test]
    async fn failed_initial_fetch_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        assert!(KeyCache::load(reqwest::Client::new(), server.url("/keys")).await.is_err());
    }
}
