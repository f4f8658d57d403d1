use std::fmt;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClusterConfig;
use crate::error::ClusterError;

const MAX_ERROR_BODY: usize = 512;

/// JSON client bound to one API server.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ClusterClient {
    base: String,
    token: Option<SecretString>,
    http: reqwest::Client,
}

impl ClusterClient {
    /// Build a client, reading the token and CA files named in `cfg`.
    ///
    /// # Errors
    /// Returns [`ClusterError::Config`] if a file cannot be read or parsed.
    pub fn from_config(cfg: &ClusterConfig) -> Result<Self, ClusterError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("carrier-gateway/", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &cfg.ca_file {
            let pem = std::fs::read(path).map_err(|e| {
                ClusterError::Config(format!("reading CA file {}: {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ClusterError::Config(format!("parsing CA file {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let token = match &cfg.token_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ClusterError::Config(format!("reading token file {}: {e}", path.display()))
                })?;
                Some(SecretString::from(raw.trim().to_owned()))
            }
            None => None,
        };

        let http = builder
            .build()
            .map_err(|e| ClusterError::Config(e.to_string()))?;

        Ok(Self {
            base: cfg.server.trim_end_matches('/').to_owned(),
            token,
            http,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `GET {server}{path}` and decode the JSON body.
    ///
    /// # Errors
    /// See [`ClusterError`]; a 404 maps to [`ClusterError::NotFound`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClusterError> {
        self.send(self.http.get(self.url(path))).await
    }

    /// `POST {server}{path}` with a JSON body and decode the JSON answer.
    ///
    /// # Errors
    /// See [`ClusterError`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClusterError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClusterError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClusterError::NotFound);
        }
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            tracing::debug!(status = status.as_u16(), "cluster request rejected");
            return Err(ClusterError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClusterError::Decode(e.to_string()))
    }
}

impl fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClient")
            .field("base", &self.base)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use httpmock::prelude::*;
    use serde_json::{Value, json};

    use super::*;

    #[tokio::test]
    async fn post_sends_bearer_token_and_decodes_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/apis/demo/v1/reviews")
                    .header("authorization", "Bearer sa-token");
                then.status(201).json_body(json!({"status": {"ok": true}}));
            })
            .await;

        let mut token_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(token_file, "sa-token").unwrap();
        let cfg = ClusterConfig {
            token_file: Some(token_file.path().to_path_buf()),
            ..ClusterConfig::for_server(server.base_url())
        };
        let client = ClusterClient::from_config(&cfg).unwrap();

        let out: Value = client
            .post_json("/apis/demo/v1/reviews", &json!({"spec": {}}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out["status"]["ok"], json!(true));
    }

    #[tokio::test]
    async fn not_found_and_error_statuses_are_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/forbidden");
                then.status(403).body("forbidden");
            })
            .await;
        let client = ClusterClient::from_config(&ClusterConfig::for_server(server.base_url())).unwrap();

        let missing = client.get_json::<Value>("/missing").await.unwrap_err();
        assert!(matches!(missing, ClusterError::NotFound));

        let forbidden = client.get_json::<Value>("/forbidden").await.unwrap_err();
        assert!(matches!(forbidden, ClusterError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn unparseable_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/garbage");
                then.status(200).body("<html>");
            })
            .await;
        let client = ClusterClient::from_config(&ClusterConfig::for_server(server.base_url())).unwrap();

        let err = client.get_json::<Value>("/garbage").await.unwrap_err();
        assert!(matches!(err, ClusterError::Decode(_)));
    }

    #[test]
    fn missing_token_file_is_a_config_error() {
        let cfg = ClusterConfig {
            token_file: Some("/nonexistent/token".into()),
            ..ClusterConfig::for_server("http://127.0.0.1:1")
        };
        assert!(matches!(ClusterClient::from_config(&cfg), Err(ClusterError::Config(_))));
    }

    #[test]
    fn debug_redacts_token() {
        let client = ClusterClient {
            base: "https://cluster".to_owned(),
            token: Some(SecretString::from("very-secret".to_owned())),
            http: reqwest::Client::new(),
        };
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("very-secret"));
    }
}
