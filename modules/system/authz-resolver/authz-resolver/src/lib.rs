//! Authorizer
//!
//! Answers "may the authenticated caller do this?" by resolving the resource
//! type to its API resource and asking the cluster's subject access review
//! API. Verdicts are never cached.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{AuthorizerConfig, RestMappingConfig};
pub use domain::{Authorizer, DomainError, HttpAccessReviewer, PERMISSION_DENIED, StaticRestMapper, pluralize};
