//! The credential provider contract.

use async_trait::async_trait;
use clap::{ArgMatches, Command};

use crate::context::CallContext;
use crate::error::{AuthError, InitError};
use crate::identity::UserInfo;

/// One credential scheme (Basic against htpasswd, OIDC bearer tokens, ...).
///
/// Lifecycle: `add_flags` while the CLI is built, `init` once after parsing
/// and before the server accepts requests, then `authenticate` from any
/// number of concurrent requests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Name used to select the provider with `--authentication-mode`.
    fn name(&self) -> &'static str;

    /// Register this provider's command line flags.
    fn add_flags(&self, cmd: Command) -> Command {
        cmd
    }

    /// One-time setup from the parsed flags.
    ///
    /// Must not return before the provider can serve `authenticate`. Network
    /// bound setup (key discovery and the like) is awaited here.
    ///
    /// # Errors
    /// Returns [`InitError`] if the flags are invalid or setup fails.
    async fn init(&self, flags: &ArgMatches) -> Result<(), InitError>;

    /// Validate this provider's credential kind in the call metadata.
    ///
    /// # Errors
    /// - [`AuthError::Unauthenticated`] when the credential is absent or invalid
    /// - [`AuthError::Internal`] when a backend dependency fails
    async fn authenticate(&self, ctx: &CallContext) -> Result<UserInfo, AuthError>;
}
