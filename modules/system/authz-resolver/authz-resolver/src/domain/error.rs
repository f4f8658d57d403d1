//! Domain errors for the authorizer.

use authz_resolver_sdk::ReviewError;
use carrier_auth::AuthError;

use super::authorizer::PERMISSION_DENIED;

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("no resource mapping for kind '{0}'")]
    UnmappedKind(String),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("access review did not allow the request")]
    NotAllowed,
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotAllowed => Self::permission_denied(PERMISSION_DENIED),
            DomainError::UnmappedKind(kind) => Self::internal(format!("no resource mapping for kind {kind}")),
            DomainError::Review(_) => Self::internal("access review failed"),
        }
    }
}
