//! Token review oracle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use carrier_http::ClusterClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_REVIEW_PATH: &str = "/apis/authentication.k8s.io/v1/tokenreviews";

#[derive(Debug, Error)]
#[error("token review failed: {0}")]
pub struct ReviewError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReviewedUser {
    pub username: String,
    pub uid: String,
    pub groups: Vec<String>,
    pub extra: BTreeMap<String, Vec<String>>,
}

/// Verdict of a token review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenReviewStatus {
    pub authenticated: bool,
    pub user: ReviewedUser,
    pub audiences: Vec<String>,
    pub error: String,
}

/// Something that can tell whether a bearer token is valid.
#[async_trait]
pub trait TokenReviewer: Send + Sync {
    /// # Errors
    /// Returns [`ReviewError`] if the oracle could not be asked.
    async fn review(&self, token: &str) -> Result<TokenReviewStatus, ReviewError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenReview<'a> {
    api_version: &'static str,
    kind: &'static str,
    spec: TokenReviewSpec<'a>,
}

#[derive(Serialize)]
struct TokenReviewSpec<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct TokenReviewResponse {
    #[serde(default)]
    status: TokenReviewStatus,
}

/// Reviews tokens through the cluster's `TokenReview` API.
#[derive(Debug, Clone)]
pub struct HttpTokenReviewer {
    client: ClusterClient,
}

impl HttpTokenReviewer {
    #[must_use]
    pub fn new(client: ClusterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenReviewer for HttpTokenReviewer {
    async fn review(&self, token: &str) -> Result<TokenReviewStatus, ReviewError> {
        let body = TokenReview {
            api_version: "authentication.k8s.io/v1",
            kind: "TokenReview",
            spec: TokenReviewSpec { token },
        };
        let response: TokenReviewResponse = self
            .client
            .post_json(TOKEN_REVIEW_PATH, &body)
            .await
            .map_err(|e| ReviewError(e.to_string()))?;
        Ok(response.status)
    }
}
