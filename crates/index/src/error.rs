use thiserror::Error;

/// Errors raised by index clients.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("invalid index config: {0}")]
    Config(String),
    #[error("index request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("index `{0}` not found")]
    NotFound(String),
    #[error("response decode error: {0}")]
    Decode(String),
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("dimension mismatch: index holds {expected}-d vectors, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl IndexError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            IndexError::Timeout | IndexError::Transport(_) => true,
            IndexError::Http { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IndexError::Timeout
        } else if err.is_decode() {
            IndexError::Decode(err.to_string())
        } else {
            IndexError::Transport(err.to_string())
        }
    }
}
