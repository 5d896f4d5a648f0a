use crate::config::ServerConfig;
use imgsearch::config::UiYamlConfig;
use imgsearch::{AppContext, SearchConfig};
use std::sync::Arc;

/// Shared application state
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Embedder and index handles, built once and shared across requests
    pub search: AppContext,

    /// Page copy and grid width
    pub ui: Arc<UiYamlConfig>,
}

impl ServerState {
    /// Load the pipeline configuration and connect the search context
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let search_config = SearchConfig::load(config.search_config.as_deref())?;
        let search = AppContext::from_config(&search_config).await?;
        Ok(Self::with_context(config, search, search_config.ui))
    }

    /// Searches that outlive the request timeout would end in a bare timeout
    /// response, so the pipeline deadline is capped below it.
    pub fn with_context(config: ServerConfig, mut search: AppContext, ui: UiYamlConfig) -> Self {
        let cap = config.search_deadline();
        if search.settings.deadline > cap {
            tracing::warn!(
                configured_ms = search.settings.deadline.as_millis() as u64,
                capped_ms = cap.as_millis() as u64,
                "search deadline lowered to fit the request timeout"
            );
            search.settings.deadline = cap;
        }
        Self {
            config: Arc::new(config),
            search,
            ui: Arc::new(ui),
        }
    }

    pub fn columns_per_row(&self) -> usize {
        self.ui.columns_per_row
    }
}
