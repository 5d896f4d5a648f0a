//! HTML routes. Every outcome, including failures, renders as the search
//! page with a status line; raw errors never reach the browser.

use crate::error::ServerError;
use crate::page::{render_page, PageBody, NO_UPLOAD_MESSAGE, UNSUPPORTED_UPLOAD_MESSAGE};
use crate::state::ServerState;
use crate::upload::read_upload;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use imgsearch::{search, PipelineError, SearchView, UserAction};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: String,
}

/// `GET /`
pub async fn index_page(State(state): State<Arc<ServerState>>) -> Html<String> {
    Html(render_page(&state.ui, PageBody::default()))
}

/// `POST /search`
pub async fn search_text(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<SearchForm>,
) -> Html<String> {
    let result = search(&state.search, UserAction::TextSearch(form.query.clone())).await;
    let view = SearchView::from_result(result, state.columns_per_row());
    log_view("text", &view);

    Html(render_page(
        &state.ui,
        PageBody {
            query: Some(&form.query),
            view: Some(&view),
            ..PageBody::default()
        },
    ))
}

/// `POST /search/image`
pub async fn search_image(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            let notice = match &err {
                ServerError::UnsupportedUpload(_) => UNSUPPORTED_UPLOAD_MESSAGE,
                _ => NO_UPLOAD_MESSAGE,
            };
            tracing::info!(error = %err, "upload rejected");
            let page = render_page(
                &state.ui,
                PageBody {
                    notice: Some(notice),
                    ..PageBody::default()
                },
            );
            return (err.status_code(), Html(page)).into_response();
        }
    };

    let result = search(&state.search, UserAction::ImageUpload(upload.bytes.clone())).await;
    // An undecodable upload gets no preview; the browser could not show it either.
    let decoded = !matches!(result, Err(PipelineError::ImageDecode(_)));
    let view = SearchView::from_result(result, state.columns_per_row());
    log_view("image", &view);
    let preview = decoded.then_some(&upload);

    let page = render_page(
        &state.ui,
        PageBody {
            preview,
            view: Some(&view),
            ..PageBody::default()
        },
    );
    (StatusCode::OK, Html(page)).into_response()
}

fn log_view(kind: &str, view: &SearchView) {
    match view {
        SearchView::Results { grid } => {
            tracing::info!(
                kind,
                matches = grid.cell_count(),
                rows = grid.row_count(),
                "search rendered"
            )
        }
        SearchView::Empty { .. } => tracing::info!(kind, "search returned no matches"),
        SearchView::Rejected { .. } => tracing::info!(kind, "search rejected"),
        SearchView::Failed { retryable, .. } => {
            tracing::warn!(kind, retryable, "search failed")
        }
    }
}
