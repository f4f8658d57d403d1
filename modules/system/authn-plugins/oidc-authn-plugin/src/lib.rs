#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! OIDC authentication provider.
//!
//! Validates `Authorization: Bearer` ID tokens issued by a configured OIDC
//! provider. Discovery and the initial key fetch happen in `init`, so the
//! provider is ready to verify tokens as soon as `init` returns.

pub mod config;
pub mod discovery;
pub mod jwks;
pub mod provider;
pub mod verifier;

pub use config::{NO_PREFIX, OidcArgs, OidcOptions};
pub use provider::OidcProvider;
pub use verifier::TokenVerifier;
