use axum::Json;
use serde::Serialize;

use crate::auth::Authenticated;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub platform: String,
}

impl VersionInfo {
    /// `version` on the platform this binary was built for.
    #[must_use]
    pub fn current(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::current(env!("CARGO_PKG_VERSION"))
    }
}

/// The caller's identity as the chain resolved it.
///
/// # Errors
/// `Unauthenticated` when served on a public route.
pub async fn whoami(Authenticated(ctx): Authenticated) -> Result<Json<WhoAmI>, ApiError> {
    let identity = ctx
        .extract_identity()
        .map_err(|err| ApiError::for_request(err, ctx.metadata()))?;
    Ok(Json(WhoAmI {
        user: identity.name().to_owned(),
        groups: identity.groups().to_vec(),
    }))
}
