//! Error types for authorizer collaborators.

use thiserror::Error;

/// The access review oracle could not be asked.
///
/// A negative verdict is not an error; it is expressed through
/// [`crate::AccessReviewStatus`].
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The request never produced a usable response.
    #[error("access review transport failure: {0}")]
    Transport(String),

    /// The oracle answered with something that is not a review.
    #[error("malformed access review response: {0}")]
    Malformed(String),
}
