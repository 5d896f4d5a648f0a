use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::EmbedError;

/// One search request, resolved to exactly one modality.
#[derive(Debug, Clone)]
pub enum Query {
    /// Free text as typed by the user.
    Text(String),
    /// Decoded upload.
    Image(DynamicImage),
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Text(_) => QueryKind::Text,
            Query::Image(_) => QueryKind::Image,
        }
    }
}

/// Modality tag, surfaced in logs and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Text,
    Image,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Text => f.write_str("text"),
            QueryKind::Image => f.write_str("image"),
        }
    }
}

/// Embedding output for a single query.
///
/// Produced fresh per request and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryEmbedding {
    /// Final embedding values.
    pub vector: Vec<f32>,
    /// Name of the model that produced the vector.
    pub model_name: String,
    /// Dimension of [`vector`](Self::vector).
    pub dimension: usize,
    /// Whether [`vector`](Self::vector) was L2-normalized.
    pub normalized: bool,
}

impl QueryEmbedding {
    pub(crate) fn new(vector: Vec<f32>, model_name: &str, normalized: bool) -> Self {
        let dimension = vector.len();
        Self {
            vector,
            model_name: model_name.to_string(),
            dimension,
            normalized,
        }
    }
}

/// Re-encode a decoded image as PNG so it can travel over HTTP or into an
/// encoder that wants encoded bytes.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EmbedError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| EmbedError::ImageEncode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn query_kind_matches_variant() {
        assert_eq!(Query::Text("shoes".into()).kind(), QueryKind::Text);
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert_eq!(Query::Image(img).kind(), QueryKind::Image);
    }

    #[test]
    fn query_kind_display_and_serde() {
        assert_eq!(QueryKind::Image.to_string(), "image");
        assert_eq!(serde_json::to_string(&QueryKind::Text).unwrap(), "\"text\"");
    }

    #[test]
    fn embedding_dimension_tracks_vector() {
        let emb = QueryEmbedding::new(vec![0.1, 0.2, 0.3], "clip", false);
        assert_eq!(emb.dimension, 3);
        assert_eq!(emb.model_name, "clip");
        assert!(!emb.normalized);
    }

    #[test]
    fn encode_png_produces_png_signature() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([200, 10, 10])));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
