//! The authorizer.

use std::sync::Arc;

use authz_resolver_sdk::{AccessReviewRequest, AccessReviewer, AuthRequest, AuthorizationOption, Decision, RestMapper};
use carrier_auth::{AuthError, CallContext};

use super::DomainError;

/// Message of every authorization refusal. Oracle details are only logged.
pub const PERMISSION_DENIED: &str = "permission denied";

/// Checks authenticated calls against the access review oracle.
#[derive(Clone)]
pub struct Authorizer {
    mapper: Arc<dyn RestMapper>,
    reviewer: Arc<dyn AccessReviewer>,
}

impl Authorizer {
    #[must_use]
    pub fn new(mapper: Arc<dyn RestMapper>, reviewer: Arc<dyn AccessReviewer>) -> Self {
        Self { mapper, reviewer }
    }

    /// Allow or refuse `option` on resources of kind `type_tag` for the
    /// identity attached to `ctx`.
    ///
    /// # Errors
    /// - [`AuthError::Unauthenticated`] if `ctx` carries no identity
    /// - [`AuthError::Internal`] if the kind is unmapped or the oracle is unreachable
    /// - [`AuthError::PermissionDenied`] if the oracle does not allow the request
    #[tracing::instrument(skip_all, fields(kind = type_tag, verb = %option.verb))]
    pub async fn authorize(
        &self,
        ctx: &CallContext,
        type_tag: &str,
        option: AuthorizationOption,
    ) -> Result<(), AuthError> {
        let identity = ctx.extract_identity()?;

        let resource = self.mapper.resolve(type_tag).ok_or_else(|| {
            tracing::error!(kind = type_tag, "resource kind has no mapping");
            AuthError::from(DomainError::UnmappedKind(type_tag.to_owned()))
        })?;

        let request = AccessReviewRequest {
            resource,
            name: option.name,
            namespace: option.namespace,
            verb: option.verb,
            user: identity.name().to_owned(),
            groups: identity.groups().to_vec(),
            uid: identity.uid().to_owned(),
            extra: identity.extra().clone(),
        };

        let status = ctx.run(self.reviewer.review(&request)).await?.map_err(|e| {
            tracing::error!(error = %e, "access review failed");
            AuthError::from(DomainError::from(e))
        })?;

        let decision = status.decision();
        if decision == Decision::Allowed {
            return Ok(());
        }
        tracing::debug!(user = identity.name(), ?decision, reason = %status.reason, "access review refused");
        Err(DomainError::NotAllowed.into())
    }

    /// [`Authorizer::authorize`] for a request that describes itself.
    ///
    /// # Errors
    /// See [`Authorizer::authorize`].
    pub async fn authorize_request<R>(&self, ctx: &CallContext, request: &R) -> Result<(), AuthError>
    where
        R: AuthRequest + ?Sized,
    {
        self.authorize(ctx, request.resource_kind(), request.auth_option()).await
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}
