use thiserror::Error;

/// Failure from a library or tracker collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    /// The service answered but refused the request (JSON-RPC error object,
    /// non-2xx status with a body, and the like).
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl SourceError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
