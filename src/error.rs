use std::time::Duration;

use embed::EmbedError;
use index::IndexError;
use thiserror::Error;

/// Failures of one search interaction.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Blank text query; no external call was made.
    #[error("query text is empty")]
    InvalidInput,
    /// The upload could not be decoded into pixels.
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
    #[error("embedding did not finish within {0:?}")]
    EmbeddingTimeout(Duration),
    #[error("index query failed: {0}")]
    IndexQuery(#[from] IndexError),
    #[error("index query did not finish within {0:?}")]
    IndexTimeout(Duration),
    /// The whole search, retries included, ran past its deadline.
    #[error("search did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl PipelineError {
    /// Whether the same request may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::InvalidInput | PipelineError::ImageDecode(_) => false,
            PipelineError::Embedding(err) => err.is_retryable(),
            PipelineError::IndexQuery(err) => err.is_retryable(),
            PipelineError::EmbeddingTimeout(_)
            | PipelineError::IndexTimeout(_)
            | PipelineError::DeadlineExceeded(_) => true,
        }
    }

    /// Failures caused by the request itself rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput | PipelineError::ImageDecode(_)
        )
    }
}
