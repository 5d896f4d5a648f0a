//! JSON search endpoints.

use crate::error::ServerResult;
use crate::state::ServerState;
use crate::upload::read_upload;
use axum::extract::{Multipart, State};
use axum::Json;
use imgsearch::{search, QueryKind, SearchView, UserAction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Search result body: the view plus request facts.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub kind: QueryKind,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub view: SearchView,
}

/// `POST /api/v1/search`
pub async fn search_text(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SearchRequest>,
) -> ServerResult<Json<SearchResponse>> {
    run(&state, QueryKind::Text, UserAction::TextSearch(request.query)).await
}

/// `POST /api/v1/search/image`
pub async fn search_image(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> ServerResult<Json<SearchResponse>> {
    let upload = read_upload(multipart).await?;
    run(&state, QueryKind::Image, UserAction::ImageUpload(upload.bytes)).await
}

async fn run(
    state: &ServerState,
    kind: QueryKind,
    action: UserAction,
) -> ServerResult<Json<SearchResponse>> {
    let start = Instant::now();
    let outcome = search(&state.search, action).await?;
    let view = SearchView::from_result(Ok(outcome), state.columns_per_row());

    Ok(Json(SearchResponse {
        kind,
        elapsed_ms: start.elapsed().as_millis() as u64,
        view,
    }))
}
