use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::{Extensions, HeaderMap};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::AuthError;
use crate::identity::Identity;

const NO_USER_INFO: &str = "no user information found";

/// Private key under which the authenticated identity is stored.
/// Nothing outside this crate can name it, so nothing else can alias it.
#[derive(Clone)]
struct IdentitySlot(Arc<Identity>);

/// Per-call state handed to providers, the chain and the authorizer.
///
/// Carries the call's metadata (headers), its cancellation token and
/// deadline, and once authenticated, the caller's [`Identity`]. Contexts are
/// cheap to clone and immutable: [`CallContext::with_identity`] derives a new
/// one instead of mutating.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: HeaderMap,
    extensions: Extensions,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    #[must_use]
    pub fn new(metadata: HeaderMap) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails `Internal` if the call was cancelled or its deadline passed.
    ///
    /// # Errors
    /// Returns [`AuthError::Internal`] when the call is no longer live.
    pub fn ensure_live(&self) -> Result<(), AuthError> {
        if self.cancellation.is_cancelled() {
            return Err(AuthError::internal("request cancelled"));
        }
        if self.deadline.is_some_and(|at| at <= Instant::now()) {
            return Err(AuthError::internal("deadline exceeded"));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the call is cancelled or times out first.
    ///
    /// # Errors
    /// Returns [`AuthError::Internal`] on cancellation or deadline expiry.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, AuthError>
    where
        F: Future,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Err(AuthError::internal("request cancelled")),
            () = deadline => Err(AuthError::internal("deadline exceeded")),
            out = fut => Ok(out),
        }
    }

    /// Derive a context that carries `identity`.
    pub(crate) fn with_identity(mut self, identity: Identity) -> Self {
        self.extensions.insert(IdentitySlot(Arc::new(identity)));
        self
    }

    /// The identity the chain attached to this call.
    ///
    /// # Errors
    /// Returns [`AuthError::Unauthenticated`] if the call was never authenticated.
    pub fn extract_identity(&self) -> Result<&Identity, AuthError> {
        self.extensions
            .get::<IdentitySlot>()
            .map(|slot| slot.0.as_ref())
            .ok_or_else(|| AuthError::unauthenticated(NO_USER_INFO))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::identity::UserInfo;

    #[test]
    fn extract_without_identity_is_unauthenticated() {
        let ctx = CallContext::default();
        assert_eq!(
            ctx.extract_identity(),
            Err(AuthError::Unauthenticated(NO_USER_INFO.to_owned()))
        );
    }

    #[test]
    fn with_identity_derives_a_new_context() {
        let base = CallContext::default();
        let identity = Identity::from_user_info(UserInfo::new("alice").with_groups(["dev"]));

        let derived = base.clone().with_identity(identity.clone());

        assert_eq!(derived.extract_identity().unwrap(), &identity);
        assert!(base.extract_identity().is_err());
    }

    #[test]
    fn unrelated_extension_types_do_not_alias_the_identity() {
        let mut ctx = CallContext::default();
        ctx.extensions.insert(Arc::new(Identity::from_user_info(UserInfo::new("mallory"))));
        ctx.extensions.insert("identity".to_owned());

        assert!(ctx.extract_identity().unwrap_err().is_unauthenticated());
    }

    #[tokio::test]
    async fn run_returns_future_output_when_live() {
        let ctx = CallContext::default().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::default().with_cancellation(token.clone());
        token.cancel();

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(AuthError::internal("request cancelled")));
        assert!(ctx.ensure_live().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_at_deadline() {
        let ctx = CallContext::default().with_timeout(Duration::from_millis(50));

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(AuthError::internal("deadline exceeded")));
    }
}
