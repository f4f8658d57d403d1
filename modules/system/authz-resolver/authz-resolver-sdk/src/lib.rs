#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorizer SDK
//!
//! Shared vocabulary between request handlers and the authorizer:
//!
//! - [`AuthorizationOption`], [`Verb`] - what a handler wants to do
//! - [`ResourceDescriptor`] - the API resource a type tag maps to
//! - [`AccessReviewRequest`], [`AccessReviewStatus`], [`Decision`] - the
//!   question asked of the access review oracle and its answer
//! - [`RestMapper`], [`AccessReviewer`] - the authorizer's collaborators
//! - [`AuthRequest`] - requests that know their own authorization needs
//!
//! ## Usage
//!
//! ```ignore
//! use authz_resolver_sdk::{AuthorizationOption, Verb};
//!
//! let option = AuthorizationOption::new(Verb::List).namespace("acme");
//! authorizer.authorize(&ctx, "Offering", &option).await?;
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::{AccessReviewer, AuthRequest, RestMapper};
pub use error::ReviewError;
pub use models::{
    AccessReviewRequest, AccessReviewStatus, AuthorizationOption, Decision, ParseVerbError,
    ResourceDescriptor, Verb,
};
