#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Service account token authentication provider.
//!
//! Bearer tokens are handed to the cluster's token review API. The reviewed
//! user becomes the caller's identity, optionally restricted to tokens bound
//! to one of the configured API audiences.

pub mod config;
pub mod provider;
pub mod review;

pub use config::{TokenArgs, TokenOptions};
pub use provider::{TokenProvider, WRONG_AUDIENCE};
pub use review::{HttpTokenReviewer, ReviewError, ReviewedUser, TokenReviewStatus, TokenReviewer};
