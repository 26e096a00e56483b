use thiserror::Error;

/// Everything a wall operation can fail with. Each variant is meant to be
/// shown to the viewer as-is except `Telemetry`, which is only logged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any remote call (empty content, missing title).
    #[error("{0}")]
    Validation(String),

    #[error("You must be signed in to do that")]
    AuthenticationRequired,

    #[error("Only the wall owner can do that")]
    Authorization,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("{0} not found")]
    NotFound(String),

    /// Network or remote failure. Safe to retry.
    #[error("{0}")]
    Backend(String),

    /// The backend answered with something that does not decode into the
    /// expected record type.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Failed to record wall visit: {0}")]
    Telemetry(String),

    #[error("Local storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Backend(_) | ClientError::IncorrectPassword)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Malformed(e.to_string())
        } else {
            ClientError::Backend(format!("Request failed: {}", e))
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
