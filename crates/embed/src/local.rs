//! Local CLIP ViT-B/32 through fastembed.
//!
//! Both encoders are expensive to construct, so each is built on first use
//! and reused for every later query handled by the same embedder.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};
use once_cell::sync::OnceCell;

use crate::normalize::l2_normalize_in_place;
use crate::types::encode_png;
use crate::{EmbedError, Embedder, Query, QueryEmbedding};

enum LocalInput {
    Text(String),
    Png(Vec<u8>),
}

#[derive(Clone)]
pub struct LocalClipEmbedder {
    text_model: Arc<OnceCell<TextEmbedding>>,
    image_model: Arc<OnceCell<ImageEmbedding>>,
    model_name: String,
    normalize: bool,
}

impl LocalClipEmbedder {
    pub fn new(model_name: impl Into<String>, normalize: bool) -> Self {
        Self {
            text_model: Arc::new(OnceCell::new()),
            image_model: Arc::new(OnceCell::new()),
            model_name: model_name.into(),
            normalize,
        }
    }

    fn run(
        text_model: &OnceCell<TextEmbedding>,
        image_model: &OnceCell<ImageEmbedding>,
        input: LocalInput,
    ) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = match input {
            LocalInput::Text(text) => {
                let model = text_model
                    .get_or_try_init(|| {
                        tracing::info!("loading CLIP text encoder");
                        TextEmbedding::try_new(InitOptions::new(EmbeddingModel::ClipVitB32))
                    })
                    .map_err(|e| EmbedError::Inference(e.to_string()))?;
                model
                    .embed(vec![text], None)
                    .map_err(|e| EmbedError::Inference(e.to_string()))?
            }
            LocalInput::Png(bytes) => {
                let model = image_model
                    .get_or_try_init(|| {
                        tracing::info!("loading CLIP image encoder");
                        ImageEmbedding::try_new(ImageInitOptions::new(
                            ImageEmbeddingModel::ClipVitB32,
                        ))
                    })
                    .map_err(|e| EmbedError::Inference(e.to_string()))?;
                model
                    .embed_bytes(&[bytes.as_slice()], None)
                    .map_err(|e| EmbedError::Inference(e.to_string()))?
            }
        };
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Inference("model returned no outputs".into()))
    }
}

#[async_trait]
impl Embedder for LocalClipEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, query: &Query) -> Result<QueryEmbedding, EmbedError> {
        let input = match query {
            Query::Text(text) => LocalInput::Text(text.clone()),
            Query::Image(image) => LocalInput::Png(encode_png(image)?),
        };
        let text_model = Arc::clone(&self.text_model);
        let image_model = Arc::clone(&self.image_model);

        let mut vector =
            tokio::task::spawn_blocking(move || Self::run(&text_model, &image_model, input))
                .await
                .map_err(|e| EmbedError::Inference(format!("inference task failed: {e}")))??;

        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }
        Ok(QueryEmbedding::new(vector, &self.model_name, self.normalize))
    }
}
