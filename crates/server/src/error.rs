use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imgsearch::{PipelineError, SearchView};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No image uploaded")]
    MissingUpload,

    #[error("Unsupported upload type: {0}")]
    UnsupportedUpload(String),

    #[error("Search failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::MissingUpload => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedUpload(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(err) => match err {
                PipelineError::InvalidInput => StatusCode::BAD_REQUEST,
                PipelineError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Embedding(_) | PipelineError::IndexQuery(_) => {
                    StatusCode::BAD_GATEWAY
                }
                PipelineError::EmbeddingTimeout(_)
                | PipelineError::IndexTimeout(_)
                | PipelineError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            },
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::MissingUpload => "MISSING_UPLOAD",
            ServerError::UnsupportedUpload(_) => "UNSUPPORTED_MEDIA_TYPE",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Pipeline(err) => match err {
                PipelineError::InvalidInput => "INVALID_INPUT",
                PipelineError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
                PipelineError::Embedding(_) => "EMBEDDING_ERROR",
                PipelineError::IndexQuery(_) => "INDEX_ERROR",
                PipelineError::EmbeddingTimeout(_)
                | PipelineError::IndexTimeout(_)
                | PipelineError::DeadlineExceeded(_) => "UPSTREAM_TIMEOUT",
            },
        }
    }

    /// Message safe to show to clients. Pipeline failures use the same copy
    /// as the web page; their detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Pipeline(err) => SearchView::from_error(err)
                .message()
                .unwrap_or_default()
                .to_string(),
            ServerError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let retryable = match &self {
            ServerError::Pipeline(err) => Some(err.is_retryable()),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
                retryable,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ServerError::BadRequest(format!("multipart error: {}", err.body_text()))
    }
}
