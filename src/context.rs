//! Process-wide handles shared by every search.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use embed::{EmbedError, Embedder};
use index::{IndexError, VectorIndex, DEFAULT_TOP_K};
use thiserror::Error;

use crate::config::{ConfigLoadError, SearchConfig};
use crate::resilience::RetryConfig;

/// Per-request knobs of the query pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub embed_timeout: Duration,
    pub query_timeout: Duration,
    /// Upper bound for one whole search, retries and backoff included.
    pub deadline: Duration,
    pub retry: RetryConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            embed_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }
}

/// Embedder, index handle and settings, built once at startup and shared
/// read-only across requests. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppContext {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub settings: PipelineSettings,
}

impl AppContext {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Construct the embedder and connect to the index described by `config`.
    pub async fn from_config(config: &SearchConfig) -> Result<Self, ContextError> {
        let embedder = embed::build_embedder(&config.embed.to_embed_config()?)?;
        let index = config.index.connect().await?;
        let settings = config.pipeline.to_settings();

        tracing::info!(
            model = embedder.model_name(),
            index = index.name(),
            top_k = settings.top_k,
            "search context ready"
        );

        Ok(Self {
            embedder,
            index,
            settings,
        })
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("embedder", &self.embedder.model_name())
            .field("index", &self.index.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Startup failures while building an [`AppContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error("embedder setup failed: {0}")]
    Embed(#[from] EmbedError),
    #[error("index setup failed: {0}")]
    Index(#[from] IndexError),
}
