//! Error types for authentication and provider setup.

use thiserror::Error;

/// Per-request authentication and authorization failures.
///
/// Only [`AuthError::Unauthenticated`] lets the chain move on to the next
/// provider. Everything else is returned to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The credential is absent, malformed or did not validate.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is authenticated but not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A backend dependency failed or an invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    #[must_use]
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The message without the classification prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(msg) | Self::PermissionDenied(msg) | Self::Internal(msg) => msg,
        }
    }

    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

/// Failure of a provider's one-time initialization.
#[derive(Debug, Error)]
pub enum InitError {
    /// Flags or configuration are invalid for this provider.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A dependency needed during initialization could not be used.
    #[error("initialization failed: {0}")]
    Backend(String),

    /// `init` was called on a provider that is already initialised.
    #[error("provider already initialised")]
    AlreadyInitialized,
}

/// Registry lookup and registration errors. Startup only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown authentication mode: {0}")]
    NotFound(String),

    #[error("authentication provider registered twice: {0}")]
    Duplicate(String),
}

/// Errors building an [`crate::AuthChain`].
#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot init auth provider {name}: {source}")]
    Init {
        name: String,
        #[source]
        source: InitError,
    },

    #[error("authentication mode listed twice: {0}")]
    DuplicateMode(String),

    #[error("no authentication mode configured")]
    Empty,
}
