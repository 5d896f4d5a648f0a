//! Multipart image uploads.

use axum::extract::Multipart;

use crate::error::{ServerError, ServerResult};

/// Form field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// MIME type for the inline preview.
    pub fn preview_mime(&self) -> &'static str {
        let is_png = self
            .content_type
            .as_deref()
            .map(|ct| ct.eq_ignore_ascii_case("image/png"))
            .unwrap_or(false)
            || extension(self.file_name.as_deref()).as_deref() == Some("png");
        if is_png {
            "image/png"
        } else {
            "image/jpeg"
        }
    }
}

fn extension(file_name: Option<&str>) -> Option<String> {
    let name = file_name?;
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// jpg, jpeg and png are accepted, by file extension or declared content type.
pub fn is_accepted_image(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let by_ext = extension(file_name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let by_type = content_type
        .map(|ct| {
            let ct = ct.to_ascii_lowercase();
            ACCEPTED_CONTENT_TYPES.contains(&ct.as_str())
        })
        .unwrap_or(false);
    by_ext || by_type
}

/// Pull the `file` field out of a multipart body.
///
/// An absent or empty field is [`ServerError::MissingUpload`]; a field that is
/// neither jpg nor png is [`ServerError::UnsupportedUpload`].
pub async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        if bytes.is_empty() {
            return Err(ServerError::MissingUpload);
        }
        if !is_accepted_image(file_name.as_deref(), content_type.as_deref()) {
            let what = file_name
                .clone()
                .or(content_type.clone())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ServerError::UnsupportedUpload(what));
        }

        tracing::debug!(
            file_name = file_name.as_deref().unwrap_or(""),
            content_type = content_type.as_deref().unwrap_or(""),
            bytes = bytes.len(),
            "received upload"
        );
        return Ok(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ServerError::MissingUpload)
}
