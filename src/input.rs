//! Input resolution: one user action in, one [`Query`] out.

use embed::Query;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// The two mutually exclusive interactions the UI offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    /// "Search with text" pressed with the current text box content.
    TextSearch(String),
    /// Raw bytes of an uploaded jpg/png file.
    ImageUpload(Vec<u8>),
}

impl UserAction {
    pub fn text(query: impl Into<String>) -> Self {
        UserAction::TextSearch(query.into())
    }

    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        UserAction::ImageUpload(bytes.into())
    }
}

/// Validate and decode the payload of `action`.
///
/// Text is rejected when blank after trimming but passed on untrimmed
/// otherwise. Uploads are decoded unconditionally; a decode failure ends the
/// request.
pub fn resolve_input(action: UserAction) -> Result<Query, PipelineError> {
    match action {
        UserAction::TextSearch(text) => {
            if text.trim().is_empty() {
                tracing::debug!("rejecting blank text query");
                return Err(PipelineError::InvalidInput);
            }
            Ok(Query::Text(text))
        }
        UserAction::ImageUpload(bytes) => {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| PipelineError::ImageDecode(e.to_string()))?;
            tracing::debug!(
                width = image.width(),
                height = image.height(),
                bytes = bytes.len(),
                "decoded uploaded image"
            );
            Ok(Query::Image(image))
        }
    }
}
