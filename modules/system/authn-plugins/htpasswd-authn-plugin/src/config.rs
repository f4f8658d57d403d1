//! Command line options for the htpasswd provider.

use carrier_auth::InitError;
use clap::Args;

pub const DEFAULT_SECRET_NAME: &str = "ht-secret";
pub const DEFAULT_SECRET_NAMESPACE: &str = "kubecarrier-system";

#[derive(Debug, Clone, Args)]
pub struct HtpasswdArgs {
    /// Name of the secret holding the htpasswd file under its `auth` key.
    #[arg(long = "htpasswd-secret-name", default_value = DEFAULT_SECRET_NAME)]
    pub htpasswd_secret_name: String,

    /// Namespace of the htpasswd secret.
    #[arg(long = "htpasswd-secret-namespace", default_value = DEFAULT_SECRET_NAMESPACE)]
    pub htpasswd_secret_namespace: String,
}

/// Validated provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtpasswdOptions {
    pub secret_name: String,
    pub secret_namespace: String,
}

impl Default for HtpasswdOptions {
    fn default() -> Self {
        Self {
            secret_name: DEFAULT_SECRET_NAME.to_owned(),
            secret_namespace: DEFAULT_SECRET_NAMESPACE.to_owned(),
        }
    }
}

impl TryFrom<HtpasswdArgs> for HtpasswdOptions {
    type Error = InitError;

    fn try_from(args: HtpasswdArgs) -> Result<Self, Self::Error> {
        if args.htpasswd_secret_name.trim().is_empty() {
            return Err(InitError::Config("--htpasswd-secret-name must not be empty".to_owned()));
        }
        if args.htpasswd_secret_namespace.trim().is_empty() {
            return Err(InitError::Config(
                "--htpasswd-secret-namespace must not be empty".to_owned(),
            ));
        }
        Ok(Self {
            secret_name: args.htpasswd_secret_name,
            secret_namespace: args.htpasswd_secret_namespace,
        })
    }
}
