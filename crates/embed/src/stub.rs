use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{EmbedError, Embedder, Query, QueryEmbedding};

/// Deterministic embedder for offline demos and tests.
///
/// Generates sinusoid values derived from a hash of the text, or of the raw
/// RGB pixels for images, so equal inputs always map to equal vectors.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl StubEmbedder {
    pub fn new(
        model_name: impl Into<String>,
        dimension: usize,
        normalize: bool,
    ) -> Result<Self, EmbedError> {
        if dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "stub dimension must be >= 1".into(),
            ));
        }
        Ok(Self {
            model_name: model_name.into(),
            dimension,
            normalize,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn seed(query: &Query) -> u64 {
        match query {
            Query::Text(text) => hash64(text.as_bytes()),
            Query::Image(image) => {
                let rgb = image.to_rgb8();
                let (w, h) = rgb.dimensions();
                hash64(rgb.as_raw()) ^ ((u64::from(w) << 32) | u64::from(h))
            }
        }
    }

    pub(crate) fn vector_for(&self, query: &Query) -> Vec<f32> {
        let h = Self::seed(query);
        let mut v = vec![0f32; self.dimension];
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, query: &Query) -> Result<QueryEmbedding, EmbedError> {
        Ok(QueryEmbedding::new(
            self.vector_for(query),
            &self.model_name,
            self.normalize,
        ))
    }
}
