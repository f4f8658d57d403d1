use std::fmt;
use std::sync::Arc;

use clap::ArgMatches;

use crate::context::CallContext;
use crate::error::{AuthError, ChainError};
use crate::identity::Identity;
use crate::provider::AuthProvider;
use crate::registry::ProviderRegistry;

/// Message returned when every provider rejected the call.
pub const EXHAUSTED_MESSAGE: &str = "no auth plugin successfully authenticated the user";

/// Ordered fallback over a list of providers.
///
/// Providers are tried in order. The first success ends evaluation. An
/// `Unauthenticated` answer moves on to the next provider; any other error
/// ends evaluation and is returned as is. When the list runs out the call
/// fails with [`EXHAUSTED_MESSAGE`], which never says which providers were
/// tried.
#[derive(Clone)]
pub struct AuthChain {
    providers: Vec<Arc<dyn AuthProvider>>,
}

impl AuthChain {
    /// Build a chain over already initialised providers.
    ///
    /// # Errors
    /// Returns [`ChainError::Empty`] for an empty list.
    pub fn new(providers: Vec<Arc<dyn AuthProvider>>) -> Result<Self, ChainError> {
        if providers.is_empty() {
            return Err(ChainError::Empty);
        }
        Ok(Self { providers })
    }

    /// Select `modes` from the registry and initialise them in order.
    ///
    /// Each `init` is awaited before the next one starts, and all of them
    /// before this returns, so the chain is ready to serve once built.
    ///
    /// # Errors
    /// Unknown or repeated modes, an empty list, or a failing `init`.
    pub async fn from_registry<S: AsRef<str>>(
        registry: &ProviderRegistry,
        modes: &[S],
        flags: &ArgMatches,
    ) -> Result<Self, ChainError> {
        let mut providers: Vec<Arc<dyn AuthProvider>> = Vec::with_capacity(modes.len());
        for mode in modes {
            let mode = mode.as_ref();
            if providers.iter().any(|p| p.name() == mode) {
                return Err(ChainError::DuplicateMode(mode.to_owned()));
            }
            let provider = registry.get(mode)?;
            provider.init(flags).await.map_err(|source| ChainError::Init {
                name: mode.to_owned(),
                source,
            })?;
            tracing::info!(mode, "authentication provider initialised");
            providers.push(provider);
        }
        Self::new(providers)
    }

    /// Provider names in evaluation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Authenticate a call and return the context carrying its identity.
    ///
    /// # Errors
    /// - [`AuthError::Unauthenticated`] with [`EXHAUSTED_MESSAGE`] when no provider accepted the call
    /// - the first non-`Unauthenticated` provider error, unchanged
    /// - [`AuthError::Internal`] when the call is already cancelled or past its deadline
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(&self, ctx: CallContext) -> Result<CallContext, AuthError> {
        ctx.ensure_live()?;

        for provider in &self.providers {
            match provider.authenticate(&ctx).await {
                Ok(user) => {
                    tracing::debug!(provider = provider.name(), user = %user.name, "call authenticated");
                    return Ok(ctx.with_identity(Identity::from_user_info(user)));
                }
                Err(AuthError::Unauthenticated(reason)) => {
                    tracing::debug!(provider = provider.name(), %reason, "provider rejected credential");
                }
                Err(err) => {
                    tracing::warn!(provider = provider.name(), error = %err, "authentication aborted");
                    return Err(err);
                }
            }
        }

        Err(AuthError::unauthenticated(EXHAUSTED_MESSAGE))
    }
}

impl fmt::Debug for AuthChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthChain")
            .field("providers", &self.names())
            .finish()
    }
}
