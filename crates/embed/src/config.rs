use serde::{Deserialize, Serialize};

use crate::{DEFAULT_DIMENSION, DEFAULT_MODEL};

/// Runtime configuration selecting the embedding backend.
///
/// # Example
/// ```no_run
/// use embed::{build_embedder, EmbedConfig};
///
/// let cfg = EmbedConfig {
///     mode: "api".into(),
///     api_url: Some("https://embed.internal/clip".into()),
///     api_auth_header: Some("Bearer token".into()),
///     ..Default::default()
/// };
///
/// let _embedder = build_embedder(&cfg);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedConfig {
    /// Backend selector: `"api"` (remote HTTP), `"stub"` (deterministic) or
    /// `"local"` (fastembed CLIP, needs the `local-clip` feature).
    pub mode: String,
    /// Label surfaced on every `QueryEmbedding`.
    pub model_name: String,
    /// Endpoint used in `"api"` mode.
    pub api_url: Option<String>,
    /// Authorization header value (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Payload dialect: `"hf"` or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Output dimension. The stub produces it; the API client rejects
    /// responses of any other length.
    pub dimension: usize,
    /// Normalize vectors to unit length before querying.
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: DEFAULT_MODEL.into(),
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            dimension: DEFAULT_DIMENSION,
            normalize: false,
        }
    }
}
