#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Htpasswd authentication provider.
//!
//! Validates `Authorization: Basic` credentials against an htpasswd file kept
//! in a cluster secret under the `auth` key. Supported hash formats: bcrypt,
//! Apache MD5 (`$apr1$`), crypt MD5 (`$1$`), `{SHA}`, `{SSHA}` and plain text.
//!
//! Authenticated users get the `kubecarrier:htpasswd` group.

pub mod config;
pub mod domain;
pub mod provider;

pub use config::{HtpasswdArgs, HtpasswdOptions};
pub use domain::hash::{HashFormat, verify_password};
pub use domain::secret_store::{ClusterSecretStore, SecretData, SecretStore, SecretStoreError, StaticSecretStore};
pub use provider::{HTPASSWD_GROUP, HtpasswdProvider};
