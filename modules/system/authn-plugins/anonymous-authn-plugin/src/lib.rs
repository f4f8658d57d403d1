#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Anonymous authentication provider.
//!
//! Accepts every call as `system:anonymous` in the `system:unauthenticated`
//! group. Put it last in `--authentication-mode` so it only catches callers
//! that no other provider recognised.

pub mod provider;

pub use provider::{ANONYMOUS_GROUP, ANONYMOUS_USER, AnonymousProvider};
