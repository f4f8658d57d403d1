//! Collaborator traits used by the authorizer.

use async_trait::async_trait;

use crate::error::ReviewError;
use crate::models::{AccessReviewRequest, AccessReviewStatus, AuthorizationOption, ResourceDescriptor};

/// Maps a resource type tag (`"Offering"`) to the API resource it lives at.
pub trait RestMapper: Send + Sync {
    /// `None` if the tag is unknown.
    fn resolve(&self, type_tag: &str) -> Option<ResourceDescriptor>;
}

/// The subject access review oracle.
///
/// Verdicts must reflect live policy; implementations do not cache.
#[async_trait]
pub trait AccessReviewer: Send + Sync {
    /// # Errors
    /// Returns [`ReviewError`] if the oracle could not be asked.
    async fn review(&self, request: &AccessReviewRequest) -> Result<AccessReviewStatus, ReviewError>;
}

/// A request message that knows what it needs to be authorized for.
pub trait AuthRequest {
    fn auth_option(&self) -> AuthorizationOption;

    /// Type tag of the resource the request touches.
    fn resource_kind(&self) -> &str;
}
