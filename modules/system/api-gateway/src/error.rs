//! Rendering of [`AuthError`] for REST and `gRPC` callers.

use axum::Json;
use axum::response::{IntoResponse, Response};
use carrier_auth::AuthError;
use http::{HeaderMap, StatusCode, header};
use serde::Serialize;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "internal error";
const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Invalid gateway configuration, detected while building the router.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid route pattern '{path}': {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("route '{path}' has no path parameter '{param}'")]
    UnknownParam { path: String, param: String },
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid bind address '{addr}': {source}")]
    BindAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON body of a REST error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'static str,
    pub message: &'a str,
}

/// Wire protocol of the caller, decided from its `content-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Rest,
    Grpc,
}

impl Protocol {
    #[must_use]
    pub fn of(headers: &HeaderMap) -> Self {
        let grpc = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(GRPC_CONTENT_TYPE));
        if grpc { Self::Grpc } else { Self::Rest }
    }
}

/// An [`AuthError`] on its way back to the caller.
///
/// `Internal` details are logged and replaced by a generic message.
#[derive(Debug)]
pub struct ApiError {
    error: AuthError,
    protocol: Protocol,
}

impl ApiError {
    #[must_use]
    pub fn new(error: AuthError, protocol: Protocol) -> Self {
        Self { error, protocol }
    }

    #[must_use]
    pub fn for_request(error: AuthError, headers: &HeaderMap) -> Self {
        Self::new(error, Protocol::of(headers))
    }

    #[must_use]
    pub fn error(&self) -> &AuthError {
        &self.error
    }

    fn public_message(&self) -> &str {
        match &self.error {
            AuthError::Internal(_) => INTERNAL_MESSAGE,
            other => other.message(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self::new(error, Protocol::Rest)
    }
}

fn http_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::Unauthenticated(_) => "unauthenticated",
        AuthError::PermissionDenied(_) => "permission_denied",
        AuthError::Internal(_) => "internal",
    }
}

fn grpc_code(err: &AuthError) -> tonic::Code {
    match err {
        AuthError::Unauthenticated(_) => tonic::Code::Unauthenticated,
        AuthError::PermissionDenied(_) => tonic::Code::PermissionDenied,
        AuthError::Internal(_) => tonic::Code::Internal,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.error {
            AuthError::Internal(msg) => tracing::error!(error = %msg, "request failed"),
            other => tracing::debug!(error = %other, "request refused"),
        }

        match self.protocol {
            Protocol::Grpc => tonic::Status::new(grpc_code(&self.error), self.public_message()).into_http(),
            Protocol::Rest => {
                let body = ErrorBody {
                    code: error_code(&self.error),
                    message: self.public_message(),
                };
                (http_status(&self.error), Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use axum::body::to_bytes;
    use http::HeaderValue;

    use super::*;

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rest_errors_map_to_http_statuses() {
        let response = ApiError::from(AuthError::unauthenticated("bad token")).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_of(response).await,
            serde_json::json!({"code": "unauthenticated", "message": "bad token"})
        );

        let response = ApiError::from(AuthError::permission_denied("permission denied")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let response = ApiError::from(AuthError::internal("dial tcp 10.0.0.1:443: refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_of(response).await["message"], INTERNAL_MESSAGE);
    }

    #[test]
    fn grpc_callers_get_a_grpc_status() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/grpc+proto"));
        assert_eq!(Protocol::of(&headers), Protocol::Grpc);

        let response = ApiError::for_request(AuthError::permission_denied("permission denied"), &headers).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["grpc-status"], "7");
    }
}
