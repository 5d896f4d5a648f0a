//! Query embedding for imgsearch.
//!
//! Maps a text query or a decoded image into a single vector in a shared
//! (cross-modal) space, so either kind can be matched against the same
//! product-image index.
//!
//! Backends:
//!
//! - **API mode** - POST the query to a remote embedding service.
//! - **Stub mode** - Deterministic hash-derived vectors. Offline demos and tests.
//! - **Local mode** - CLIP ViT-B/32 via fastembed, behind the `local-clip` feature.
//!
//! Every backend returns vectors of one fixed dimension for both modalities.
//!
//! ## Quick example
//!
//! ```no_run
//! use embed::{build_embedder, EmbedConfig, Query};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = EmbedConfig {
//!         mode: "stub".into(),
//!         ..Default::default()
//!     };
//!     let embedder = build_embedder(&cfg).unwrap();
//!     let emb = embedder.embed(&Query::Text("red sneakers".into())).await.unwrap();
//!     assert_eq!(emb.dimension, 512);
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
#[cfg(feature = "local-clip")]
mod local;
mod normalize;
mod stub;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::api::{ApiEmbedder, ApiProvider};
pub use crate::config::EmbedConfig;
pub use crate::error::{is_retryable_status, EmbedError};
#[cfg(feature = "local-clip")]
pub use crate::local::LocalClipEmbedder;
pub use crate::stub::StubEmbedder;
pub use crate::types::{Query, QueryEmbedding, QueryKind};

/// Sentence-transformers model the catalog was indexed with.
pub const DEFAULT_MODEL: &str = "clip-ViT-B-32-multilingual-v1";

/// Output dimension of CLIP ViT-B/32.
pub const DEFAULT_DIMENSION: usize = 512;

/// Maps a [`Query`] to a vector. Text and image inputs share one output space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Label of the underlying model.
    fn model_name(&self) -> &str;

    /// Embed one query.
    async fn embed(&self, query: &Query) -> Result<QueryEmbedding, EmbedError>;
}

/// Build the backend selected by `cfg.mode`.
pub fn build_embedder(cfg: &EmbedConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiEmbedder::new(cfg)?)),
        "stub" | "fast" => Ok(Arc::new(StubEmbedder::new(
            cfg.model_name.clone(),
            cfg.dimension,
            cfg.normalize,
        )?)),
        #[cfg(feature = "local-clip")]
        "local" => Ok(Arc::new(LocalClipEmbedder::new(
            cfg.model_name.clone(),
            cfg.normalize,
        ))),
        #[cfg(not(feature = "local-clip"))]
        "local" => Err(EmbedError::InvalidConfig(
            "local mode requires the `local-clip` feature".into(),
        )),
        other => Err(EmbedError::InvalidConfig(format!(
            "unknown embed mode `{other}` (expected api, stub or local)"
        ))),
    }
}
