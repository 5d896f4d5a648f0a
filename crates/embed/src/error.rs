use thiserror::Error;

use crate::types::QueryKind;

/// Errors surfaced while turning a query into a vector.
#[derive(Debug, Clone, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
    /// The embedding service did not answer within the client timeout.
    #[error("embedding request timed out")]
    Timeout,
    /// Connection-level failure before a response arrived.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The embedding service answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    /// The response body did not contain a usable vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The decoded image could not be re-encoded for transport.
    #[error("image encoding failed: {0}")]
    ImageEncode(String),
    /// Local model loading or inference failed.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The configured backend cannot embed this modality.
    #[error("{0} queries are not supported by this embedder")]
    Unsupported(QueryKind),
}

impl EmbedError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbedError::Timeout | EmbedError::Transport(_) => true,
            EmbedError::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbedError::Timeout
        } else if err.is_decode() {
            EmbedError::InvalidResponse(err.to_string())
        } else {
            EmbedError::Transport(err.to_string())
        }
    }
}

/// 408, 429 and the 5xx family are treated as transient.
pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}
