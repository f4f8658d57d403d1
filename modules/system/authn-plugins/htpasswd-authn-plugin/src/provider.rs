use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use carrier_auth::{AuthError, AuthProvider, BASIC, CallContext, InitError, UserInfo, extract_credential};
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::config::{HtpasswdArgs, HtpasswdOptions};
use crate::domain::htpasswd::HtpasswdFile;
use crate::domain::secret_store::{SecretStore, SecretStoreError};

pub const HTPASSWD_GROUP: &str = "kubecarrier:htpasswd";

/// Key of the secret entry holding the htpasswd file.
const AUTH_KEY: &str = "auth";

/// Basic-auth provider backed by an htpasswd file stored in a secret.
///
/// The secret is read on every call so password changes apply without a
/// restart.
pub struct HtpasswdProvider {
    store: Arc<dyn SecretStore>,
    options: OnceLock<HtpasswdOptions>,
}

impl HtpasswdProvider {
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            options: OnceLock::new(),
        }
    }

    /// Apply validated options. Used by `init` and directly by embedders.
    ///
    /// # Errors
    /// Returns [`InitError::AlreadyInitialized`] on a second call.
    pub fn configure(&self, options: HtpasswdOptions) -> Result<(), InitError> {
        self.options
            .set(options)
            .map_err(|_| InitError::AlreadyInitialized)
    }

    fn options(&self) -> Result<&HtpasswdOptions, AuthError> {
        self.options
            .get()
            .ok_or_else(|| AuthError::internal("htpasswd provider used before init"))
    }

    async fn load_file(&self, options: &HtpasswdOptions) -> Result<HtpasswdFile, AuthError> {
        let data = self
            .store
            .get(&options.secret_name, &options.secret_namespace)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reading htpasswd secret failed");
                match e {
                    SecretStoreError::NotFound { .. } => AuthError::internal("htpasswd secret not found"),
                    _ => AuthError::internal("getting htpasswd secret failed"),
                }
            })?;

        let raw = data
            .get(AUTH_KEY)
            .ok_or_else(|| AuthError::unauthenticated("cannot find auth data in htpasswd secret"))?;

        HtpasswdFile::parse(raw).map_err(|e| {
            tracing::error!(error = %e, "htpasswd secret is malformed");
            AuthError::internal("cannot parse auth data in htpasswd secret")
        })
    }
}

impl std::fmt::Debug for HtpasswdProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtpasswdProvider")
            .field("options", &self.options.get())
            .finish_non_exhaustive()
    }
}

/// Split a Basic credential into username and password.
fn parse_basic(credential: &str) -> Result<(String, String), AuthError> {
    let bad = || AuthError::unauthenticated("can not parse username and password");
    let decoded = STANDARD.decode(credential).map_err(|_| bad())?;
    let decoded = String::from_utf8(decoded).map_err(|_| bad())?;
    // Split on the first ':' only (RFC 7617); colons belong to the password.
    let (user, password) = decoded.split_once(':').ok_or_else(bad)?;
    Ok((user.to_owned(), password.to_owned()))
}

#[async_trait]
impl AuthProvider for HtpasswdProvider {
    fn name(&self) -> &'static str {
        "Htpasswd"
    }

    fn add_flags(&self, cmd: Command) -> Command {
        HtpasswdArgs::augment_args(cmd)
    }

    async fn init(&self, flags: &ArgMatches) -> Result<(), InitError> {
        let args = HtpasswdArgs::from_arg_matches(flags).map_err(|e| InitError::Config(e.to_string()))?;
        self.configure(HtpasswdOptions::try_from(args)?)
    }

    async fn authenticate(&self, ctx: &CallContext) -> Result<UserInfo, AuthError> {
        let credential = extract_credential(ctx.metadata(), BASIC)?;
        let (user, password) = parse_basic(credential)?;
        let options = self.options()?;

        let file = ctx.run(self.load_file(options)).await??;
        match file.verify(&user, &password) {
            Some(true) => Ok(UserInfo::new(user).with_groups([HTPASSWD_GROUP])),
            Some(false) | None => {
                tracing::debug!(user = %user, "htpasswd credentials rejected");
                Err(AuthError::unauthenticated("username or password doesn't match"))
            }
        }
    }
}
