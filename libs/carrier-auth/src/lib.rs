#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication core for the carrier gateway.
//!
//! Requests are authenticated by an [`AuthChain`]: an ordered list of
//! [`AuthProvider`]s taken from a [`ProviderRegistry`]. The first provider that
//! accepts the call's credential wins; a provider that cannot validate the
//! credential answers `Unauthenticated` and the next one is tried; any other
//! failure stops the chain.
//!
//! The resolved [`Identity`] travels with the [`CallContext`] and is read back
//! with [`CallContext::extract_identity`]. Only the chain can put it there.

pub mod chain;
pub mod context;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod provider;
pub mod registry;

pub use chain::{AuthChain, EXHAUSTED_MESSAGE};
pub use context::CallContext;
pub use credentials::{BASIC, BEARER, extract_credential};
pub use error::{AuthError, ChainError, InitError, RegistryError};
pub use identity::{Identity, UserInfo};
pub use provider::AuthProvider;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
