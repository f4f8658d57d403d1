use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    /// The client could not be built from its configuration.
    #[error("invalid cluster client configuration: {0}")]
    Config(String),

    /// The request never produced a response.
    #[error("cluster request failed: {0}")]
    Transport(String),

    #[error("cluster object not found")]
    NotFound,

    /// The server answered with a non-success status.
    #[error("cluster returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("cannot decode cluster response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClusterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
