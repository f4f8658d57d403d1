//! Domain layer for the authorizer.

pub mod access_review;
pub mod authorizer;
pub mod error;
pub mod rest_mapper;

pub use access_review::HttpAccessReviewer;
pub use authorizer::{Authorizer, PERMISSION_DENIED};
pub use error::DomainError;
pub use rest_mapper::{StaticRestMapper, pluralize};
