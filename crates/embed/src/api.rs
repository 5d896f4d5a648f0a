use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::error::EmbedError;
use crate::normalize::l2_normalize_in_place;
use crate::types::encode_png;
use crate::{EmbedConfig, Embedder, Query, QueryEmbedding};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body dialect understood by the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    /// Hugging Face inference style: `{"inputs": ...}`.
    HuggingFace,
    /// Plain `{"text": ...}` / `{"image": ...}` bodies.
    Custom,
}

impl ApiProvider {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("hf") | Some("huggingface") => ApiProvider::HuggingFace,
            _ => ApiProvider::Custom,
        }
    }
}

/// Embedder backed by a remote HTTP service.
///
/// Owns one pooled `reqwest::Client` for its whole lifetime; build it once at
/// startup and share it.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProvider,
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl ApiEmbedder {
    pub fn new(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        let url = cfg
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| EmbedError::InvalidConfig("api_url is required for api mode".into()))?
            .to_string();

        let timeout = Duration::from_secs(cfg.api_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            auth_header: cfg.api_auth_header.clone(),
            provider: ApiProvider::from_name(cfg.api_provider.as_deref()),
            model_name: cfg.model_name.clone(),
            dimension: cfg.dimension,
            normalize: cfg.normalize,
        })
    }

    pub fn provider(&self) -> ApiProvider {
        self.provider
    }

    fn build_payload(&self, query: &Query) -> Result<Value, EmbedError> {
        let payload = match query {
            Query::Text(text) => match self.provider {
                ApiProvider::HuggingFace => json!({ "inputs": text }),
                ApiProvider::Custom => json!({ "text": text }),
            },
            Query::Image(image) => {
                let encoded = STANDARD.encode(encode_png(image)?);
                match self.provider {
                    ApiProvider::HuggingFace => json!({ "inputs": { "image": encoded } }),
                    ApiProvider::Custom => json!({ "image": encoded, "format": "png" }),
                }
            }
        };
        Ok(payload)
    }

    async fn send(&self, payload: &Value) -> Result<Value, EmbedError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request.send().await.map_err(EmbedError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(EmbedError::from_reqwest)
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, query: &Query) -> Result<QueryEmbedding, EmbedError> {
        let payload = self.build_payload(query)?;
        let response = self.send(&payload).await?;

        let mut vector = parse_embeddings_from_value(response)?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::InvalidResponse("response did not contain embeddings".into()))?;
        if vector.is_empty() {
            return Err(EmbedError::InvalidResponse("embedding vector is empty".into()));
        }
        if vector.len() != self.dimension {
            return Err(EmbedError::InvalidResponse(format!(
                "expected a {}-dimensional embedding, got {}",
                self.dimension,
                vector.len()
            )));
        }

        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }

        tracing::debug!(
            kind = %query.kind(),
            model = %self.model_name,
            dimension = vector.len(),
            "remote embedding received"
        );

        Ok(QueryEmbedding::new(vector, &self.model_name, self.normalize))
    }
}

pub(crate) fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(embedding) = map.remove("embedding") {
                return parse_embedding_vector(embedding).map(|vec| vec![vec]);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => match obj.remove("embedding") {
                            Some(embedding) => vectors.push(parse_embedding_vector(embedding)?),
                            None => {
                                return Err(EmbedError::InvalidResponse(
                                    "missing `embedding` field in data item".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(EmbedError::InvalidResponse(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(EmbedError::InvalidResponse("unsupported response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbedError::InvalidResponse("non-finite embedding value".into())),
                other => Err(EmbedError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::InvalidResponse(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}
