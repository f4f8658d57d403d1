use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use carrier_auth::{AuthError, AuthProvider, BEARER, CallContext, InitError, UserInfo, extract_credential};
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::config::{OidcArgs, OidcOptions};
use crate::discovery::discover;
use crate::jwks::{DEFAULT_REFRESH_INTERVAL, KeyCache};
use crate::verifier::TokenVerifier;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Bearer-token provider for OIDC ID tokens.
#[derive(Debug)]
pub struct OidcProvider {
    verifier: OnceLock<TokenVerifier>,
    key_refresh_interval: Duration,
}

impl Default for OidcProvider {
    fn default() -> Self {
        Self {
            verifier: OnceLock::new(),
            key_refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl OidcProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum time between two key refreshes triggered by unknown key ids.
    #[must_use]
    pub fn with_key_refresh_interval(mut self, interval: Duration) -> Self {
        self.key_refresh_interval = interval;
        self
    }

    /// Discover the issuer and load its signing keys.
    ///
    /// Returns only once the provider can verify tokens.
    ///
    /// # Errors
    /// - [`InitError::Config`] if the CA file is unusable
    /// - [`InitError::Backend`] if discovery or the key fetch fails
    /// - [`InitError::AlreadyInitialized`] on a second call
    pub async fn configure(&self, options: OidcOptions) -> Result<(), InitError> {
        if self.verifier.get().is_some() {
            return Err(InitError::AlreadyInitialized);
        }

        let http = http_client(&options)?;
        let metadata = discover(&http, &options.issuer_url)
            .await
            .map_err(|e| InitError::Backend(e.to_string()))?;
        let keys = KeyCache::load(http, metadata.jwks_uri)
            .await
            .map_err(|e| InitError::Backend(e.to_string()))?
            .with_refresh_interval(self.key_refresh_interval);

        tracing::info!(issuer = %options.issuer_url, "OIDC authenticator ready");
        self.verifier
            .set(TokenVerifier::new(options, keys))
            .map_err(|_| InitError::AlreadyInitialized)
    }
}

fn http_client(options: &OidcOptions) -> Result<reqwest::Client, InitError> {
    let mut builder = reqwest::Client::builder().timeout(HTTP_TIMEOUT);
    if let Some(path) = &options.ca_file {
        let pem = std::fs::read(path)
            .map_err(|e| InitError::Config(format!("reading --oidc-ca-file {}: {e}", path.display())))?;
        let cert = reqwest::Certificate::from_pem(&pem)
            .map_err(|e| InitError::Config(format!("parsing --oidc-ca-file {}: {e}", path.display())))?;
        builder = builder.add_root_certificate(cert);
    }
    builder.build().map_err(|e| InitError::Backend(e.to_string()))
}

#[async_trait]
impl AuthProvider for OidcProvider {
    fn name(&self) -> &'static str {
        "OIDC"
    }

    fn add_flags(&self, cmd: Command) -> Command {
        OidcArgs::augment_args(cmd)
    }

    async fn init(&self, flags: &ArgMatches) -> Result<(), InitError> {
        let args = OidcArgs::from_arg_matches(flags).map_err(|e| InitError::Config(e.to_string()))?;
        self.configure(OidcOptions::try_from(args)?).await
    }

    async fn authenticate(&self, ctx: &CallContext) -> Result<UserInfo, AuthError> {
        let token = extract_credential(ctx.metadata(), BEARER)?;
        let verifier = self
            .verifier
            .get()
            .ok_or_else(|| AuthError::internal("OIDC provider used before init"))?;
        ctx.run(verifier.verify(token)).await?
    }
}
