//! YAML configuration for the search pipeline.
//!
//! One file describes the embedder, the vector index, the pipeline policy and
//! the UI layout. Every field has a default, so a minimal file only names what
//! differs. With no file at all the embed endpoint comes from
//! `IMGSEARCH_EMBED_URL` and the Pinecone key from `PINECONE_API_KEY`.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "hartlauer demo"
//!
//! embed:
//!   mode: "api"
//!   model_name: "clip-ViT-B-32-multilingual-v1"
//!   api_url: "http://localhost:8080/embed"
//!   api_provider: "custom"
//!   api_timeout_secs: 30
//!
//! index:
//!   backend: "pinecone"
//!   name: "image-search-hartlauer-crawled"
//!   api_key_env: "PINECONE_API_KEY"
//!   timeout_secs: 10
//!
//! pipeline:
//!   top_k: 8
//!   embed_timeout_secs: 30
//!   query_timeout_secs: 10
//!   deadline_secs: 60
//!   max_retries: 2
//!
//! ui:
//!   columns_per_row: 4
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use embed::{EmbedConfig, DEFAULT_DIMENSION, DEFAULT_MODEL};
use index::{
    MemoryIndex, PineconeConfig, PineconeIndex, VectorIndex, DEFAULT_CONTROLLER_URL,
    DEFAULT_INDEX_NAME, DEFAULT_TOP_K,
};
use render::DEFAULT_COLUMNS_PER_ROW;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{ContextError, PipelineSettings};
use crate::resilience::RetryConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("environment variable `{0}` is not set")]
    MissingEnv(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    #[serde(default = "default_config_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub embed: EmbedYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub pipeline: PipelineYamlConfig,

    #[serde(default)]
    pub ui: UiYamlConfig,
}

impl SearchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: SearchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when `path` is `None`, otherwise the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.embed.validate()?;
        self.index.validate()?;
        self.pipeline.validate()?;
        self.ui.validate()?;

        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            name: None,
            embed: EmbedYamlConfig::default(),
            index: IndexYamlConfig::default(),
            pipeline: PipelineYamlConfig::default(),
            ui: UiYamlConfig::default(),
        }
    }
}

/// Embedder section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedYamlConfig {
    /// `api`, `stub` or `local`.
    #[serde(default = "default_embed_mode")]
    pub mode: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default)]
    pub api_url: Option<String>,

    /// Environment variable read for the endpoint when `api_url` is unset.
    #[serde(default = "default_api_url_env")]
    pub api_url_env: Option<String>,

    #[serde(default)]
    pub api_auth_header: Option<String>,

    /// Environment variable holding the Authorization header; wins over
    /// `api_auth_header` when set.
    #[serde(default)]
    pub api_auth_env: Option<String>,

    #[serde(default)]
    pub api_provider: Option<String>,

    #[serde(default = "default_embed_timeout")]
    pub api_timeout_secs: Option<u64>,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default)]
    pub normalize: bool,
}

impl EmbedYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.mode.as_str() {
            "api" => {
                let has_url = self.api_url.as_deref().is_some_and(|u| !u.trim().is_empty());
                let has_env = self.api_url_env.as_deref().is_some_and(|v| !v.trim().is_empty());
                if !has_url && !has_env {
                    return Err(ConfigLoadError::Validation(
                        "embed.api_url or embed.api_url_env is required when embed.mode is \"api\""
                            .to_string(),
                    ));
                }
            }
            "stub" | "fast" | "local" => {}
            other => {
                return Err(ConfigLoadError::Validation(format!(
                    "embed.mode must be one of api, stub, local (got \"{other}\")"
                )))
            }
        }
        if let Some(provider) = self.api_provider.as_deref() {
            if !matches!(provider, "hf" | "huggingface" | "custom") {
                return Err(ConfigLoadError::Validation(format!(
                    "embed.api_provider must be hf or custom (got \"{provider}\")"
                )));
            }
        }
        if self.dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embed.dimension must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The literal `api_url`, else the value of `api_url_env` in api mode.
    pub fn api_url(&self) -> Result<Option<String>, ConfigLoadError> {
        if self.api_url.is_some() || self.mode != "api" {
            return Ok(self.api_url.clone());
        }
        match self.api_url_env.as_deref() {
            Some(var) => env::var(var)
                .map(Some)
                .map_err(|_| ConfigLoadError::MissingEnv(var.to_string())),
            None => Ok(None),
        }
    }

    /// Resolve environment references into an [`EmbedConfig`].
    pub fn to_embed_config(&self) -> Result<EmbedConfig, ConfigLoadError> {
        let api_auth_header = match self.api_auth_env.as_deref() {
            Some(var) => Some(env::var(var).map_err(|_| ConfigLoadError::MissingEnv(var.to_string()))?),
            None => self.api_auth_header.clone(),
        };
        Ok(EmbedConfig {
            mode: self.mode.clone(),
            model_name: self.model_name.clone(),
            api_url: self.api_url()?,
            api_auth_header,
            api_provider: self.api_provider.clone(),
            api_timeout_secs: self.api_timeout_secs,
            dimension: self.dimension,
            normalize: self.normalize,
        })
    }
}

impl Default for EmbedYamlConfig {
    fn default() -> Self {
        Self {
            mode: default_embed_mode(),
            model_name: default_model_name(),
            api_url: None,
            api_url_env: default_api_url_env(),
            api_auth_header: None,
            api_auth_env: None,
            api_provider: None,
            api_timeout_secs: default_embed_timeout(),
            dimension: default_dimension(),
            normalize: false,
        }
    }
}

/// Vector index section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    /// `pinecone` or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_index_name")]
    pub name: String,

    /// Environment variable the Pinecone API key is read from.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Skip host resolution and talk to this data-plane host directly.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_controller_url")]
    pub controller_url: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,

    /// JSON catalog for the `memory` backend.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.name.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "index.name must not be empty".to_string(),
            ));
        }
        match self.backend.as_str() {
            "pinecone" => {
                if self.api_key_env.trim().is_empty() {
                    return Err(ConfigLoadError::Validation(
                        "index.api_key_env must not be empty".to_string(),
                    ));
                }
            }
            "memory" => {
                if self.catalog_path.is_none() {
                    return Err(ConfigLoadError::Validation(
                        "index.catalog_path is required when index.backend is \"memory\""
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigLoadError::Validation(format!(
                    "index.backend must be pinecone or memory (got \"{other}\")"
                )))
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "index.timeout_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigLoadError> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigLoadError::MissingEnv(self.api_key_env.clone()))
    }

    pub fn pinecone_config(&self) -> Result<PineconeConfig, ConfigLoadError> {
        let mut cfg = PineconeConfig::new(self.api_key()?, self.name.clone());
        cfg.host = self.host.clone();
        cfg.controller_url = self.controller_url.clone();
        cfg.namespace = self.namespace.clone();
        cfg.timeout = Duration::from_secs(self.timeout_secs);
        Ok(cfg)
    }

    /// Open the configured backend.
    pub async fn connect(&self) -> Result<Arc<dyn VectorIndex>, ContextError> {
        match self.backend.as_str() {
            "memory" => {
                let path = self.catalog_path.as_ref().ok_or_else(|| {
                    ConfigLoadError::Validation("index.catalog_path is not set".to_string())
                })?;
                let index = MemoryIndex::from_json_file(self.name.clone(), path)?;
                tracing::info!(
                    index = %self.name,
                    records = index.len(),
                    catalog = %path.display(),
                    "loaded in-memory catalog"
                );
                Ok(Arc::new(index))
            }
            _ => {
                let index = PineconeIndex::connect(&self.pinecone_config()?).await?;
                Ok(Arc::new(index))
            }
        }
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            name: default_index_name(),
            api_key_env: default_api_key_env(),
            host: None,
            controller_url: default_controller_url(),
            namespace: None,
            timeout_secs: default_index_timeout(),
            catalog_path: None,
        }
    }
}

/// Pipeline policy section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineYamlConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Bound on one whole search. Keep it below the server request timeout.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "true_value")]
    pub retry_jitter: bool,
}

impl PipelineYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.top_k == 0 {
            return Err(ConfigLoadError::Validation(
                "pipeline.top_k must be >= 1".to_string(),
            ));
        }
        if self.embed_timeout_secs == 0 || self.query_timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "pipeline timeouts must be >= 1 second".to_string(),
            ));
        }
        if self.deadline_secs < self.embed_timeout_secs.max(self.query_timeout_secs) {
            return Err(ConfigLoadError::Validation(
                "pipeline.deadline_secs must be >= each per-call timeout".to_string(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(ConfigLoadError::Validation(
                "pipeline.retry_max_delay_ms must be >= retry_base_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_settings(&self) -> PipelineSettings {
        PipelineSettings {
            top_k: self.top_k,
            embed_timeout: Duration::from_secs(self.embed_timeout_secs),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            deadline: Duration::from_secs(self.deadline_secs),
            retry: RetryConfig::default()
                .with_max_retries(self.max_retries)
                .with_base_delay(Duration::from_millis(self.retry_base_delay_ms))
                .with_max_delay(Duration::from_millis(self.retry_max_delay_ms))
                .with_jitter(self.retry_jitter),
        }
    }
}

impl Default for PipelineYamlConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            embed_timeout_secs: default_embed_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            deadline_secs: default_deadline_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_jitter: true,
        }
    }
}

/// Page layout and copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiYamlConfig {
    #[serde(default = "default_columns_per_row")]
    pub columns_per_row: usize,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_logo_url")]
    pub logo_url: Option<String>,

    #[serde(default = "default_logo_width")]
    pub logo_width: u32,
}

impl UiYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.columns_per_row == 0 {
            return Err(ConfigLoadError::Validation(
                "ui.columns_per_row must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for UiYamlConfig {
    fn default() -> Self {
        Self {
            columns_per_row: default_columns_per_row(),
            title: default_title(),
            description: default_description(),
            logo_url: default_logo_url(),
            logo_width: default_logo_width(),
        }
    }
}

// Default value functions
fn true_value() -> bool {
    true
}
fn default_config_version() -> String {
    "1.0".to_string()
}
fn default_embed_mode() -> String {
    "api".to_string()
}
fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_embed_timeout() -> Option<u64> {
    Some(30)
}
fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}
fn default_backend() -> String {
    "pinecone".to_string()
}
fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}
fn default_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}
fn default_controller_url() -> String {
    DEFAULT_CONTROLLER_URL.to_string()
}
fn default_index_timeout() -> u64 {
    10
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_embed_timeout_secs() -> u64 {
    30
}
fn default_query_timeout_secs() -> u64 {
    10
}
fn default_api_url_env() -> Option<String> {
    Some("IMGSEARCH_EMBED_URL".to_string())
}
fn default_deadline_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_base_delay_ms() -> u64 {
    100
}
fn default_retry_max_delay_ms() -> u64 {
    2_000
}
fn default_columns_per_row() -> usize {
    DEFAULT_COLUMNS_PER_ROW
}
fn default_title() -> String {
    "Semantic Image Search".to_string()
}
fn default_description() -> String {
    "Semantic image search uses a *text query* or an *input image* to search a database of \
     images to find images that are semantically similar to the search query."
        .to_string()
}
fn default_logo_url() -> Option<String> {
    Some(
        "https://upload.wikimedia.org/wikipedia/de/thumb/a/a2/Hartlauer_Logo.svg/640px-Hartlauer_Logo.svg.png"
            .to_string(),
    )
}
fn default_logo_width() -> u32 {
    200
}
