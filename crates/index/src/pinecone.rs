//! Pinecone serverless client.
//!
//! The control plane is consulted once, at [`PineconeIndex::connect`], to
//! resolve the index's data-plane host. Every query after that goes straight
//! to `https://{host}/query` over one pooled client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{IndexError, QueryRequest, QueryResponse, VectorIndex};

pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const API_VERSION: &str = "2024-07";

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for one Pinecone index.
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    /// Data-plane host; resolved through the control plane when `None`.
    pub host: Option<String>,
    pub controller_url: String,
    pub namespace: Option<String>,
    pub timeout: Duration,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_name: index_name.into(),
            host: None,
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
            namespace: None,
            timeout: Duration::from_secs(10),
        }
    }

    fn validate(&self) -> Result<(), IndexError> {
        if self.api_key.trim().is_empty() {
            return Err(IndexError::Config("api_key must not be empty".into()));
        }
        if self.index_name.trim().is_empty() {
            return Err(IndexError::Config("index_name must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("host", &self.host)
            .field("controller_url", &self.controller_url)
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    metric: Option<String>,
}

/// Long-lived, read-only handle on a Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    query_url: String,
    namespace: Option<String>,
}

impl PineconeIndex {
    /// Build the client, resolving the data-plane host if it is not configured.
    pub async fn connect(cfg: &PineconeConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let client = build_client(cfg.timeout)?;

        let host = match cfg.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => {
                let description = describe_index(&client, cfg).await?;
                tracing::info!(
                    index = %cfg.index_name,
                    host = %description.host,
                    dimension = ?description.dimension,
                    metric = ?description.metric,
                    "resolved pinecone index host"
                );
                description.host
            }
        };

        Ok(Self::from_parts(client, cfg, &host))
    }

    /// Build the client for a known data-plane host without any network call.
    pub fn with_host(cfg: &PineconeConfig, host: &str) -> Result<Self, IndexError> {
        cfg.validate()?;
        let client = build_client(cfg.timeout)?;
        Ok(Self::from_parts(client, cfg, host))
    }

    fn from_parts(client: reqwest::Client, cfg: &PineconeConfig, host: &str) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            index_name: cfg.index_name.clone(),
            query_url: format!("{}/query", base_url(host)),
            namespace: cfg.namespace.clone(),
        }
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, IndexError> {
        let mut body = request.clone();
        if body.namespace.is_none() {
            body.namespace = self.namespace.clone();
        }

        let response = self
            .client
            .post(&self.query_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(IndexError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<QueryResponse>()
            .await
            .map_err(IndexError::from_reqwest)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, IndexError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .map_err(|e| IndexError::Config(format!("failed to build HTTP client: {e}")))
}

/// Hosts come back from the control plane without a scheme.
fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn describe_index(
    client: &reqwest::Client,
    cfg: &PineconeConfig,
) -> Result<IndexDescription, IndexError> {
    let url = format!(
        "{}/indexes/{}",
        cfg.controller_url.trim_end_matches('/'),
        cfg.index_name
    );

    let response = client
        .get(&url)
        .header(API_KEY_HEADER, &cfg.api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .send()
        .await
        .map_err(IndexError::from_reqwest)?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(IndexError::NotFound(cfg.index_name.clone()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IndexError::Http {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<IndexDescription>()
        .await
        .map_err(IndexError::from_reqwest)
}
