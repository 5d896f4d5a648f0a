//! The query pipeline: embed, query, classify.

use std::time::Instant;

use embed::{Query, QueryEmbedding};
use index::{QueryRequest, QueryResponse, ResultSet};
use serde::{Deserialize, Serialize};

use crate::input::{resolve_input, UserAction};
use crate::resilience::retry_async;
use crate::{AppContext, PipelineError};

/// Successful pipeline result. An empty response is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "matches", rename_all = "snake_case")]
pub enum QueryOutcome {
    Matches(ResultSet),
    Empty,
}

impl QueryOutcome {
    pub fn len(&self) -> usize {
        match self {
            QueryOutcome::Matches(set) => set.len(),
            QueryOutcome::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Embed `query`, look up its nearest neighbours and return them in index
/// order. Each external call runs under its own timeout and is retried on
/// transient failure; the whole run is bounded by `settings.deadline`.
pub async fn run_query(ctx: &AppContext, query: &Query) -> Result<QueryOutcome, PipelineError> {
    let deadline = ctx.settings.deadline;
    match tokio::time::timeout(deadline, run_stages(ctx, query)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                kind = %query.kind(),
                deadline_ms = deadline.as_millis() as u64,
                "search deadline exceeded"
            );
            Err(PipelineError::DeadlineExceeded(deadline))
        }
    }
}

async fn run_stages(ctx: &AppContext, query: &Query) -> Result<QueryOutcome, PipelineError> {
    let started = Instant::now();
    let kind = query.kind();

    let embedding = embed_with_policy(ctx, query).await?;
    tracing::debug!(
        kind = %kind,
        model = %embedding.model_name,
        dimension = embedding.dimension,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "query embedded"
    );

    let request = QueryRequest::new(embedding.vector, ctx.settings.top_k);
    let response = query_with_policy(ctx, &request).await?;

    let outcome = match response.into_result_set() {
        Some(set) => QueryOutcome::Matches(set),
        None => QueryOutcome::Empty,
    };
    tracing::debug!(
        kind = %kind,
        index = ctx.index.name(),
        top_k = request.top_k,
        matches = outcome.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "query finished"
    );
    Ok(outcome)
}

/// Resolve `action` and run it. Nothing external is called when resolution
/// fails.
pub async fn search(ctx: &AppContext, action: UserAction) -> Result<QueryOutcome, PipelineError> {
    let query = resolve_input(action)?;
    run_query(ctx, &query).await
}

async fn embed_with_policy(
    ctx: &AppContext,
    query: &Query,
) -> Result<QueryEmbedding, PipelineError> {
    let timeout = ctx.settings.embed_timeout;
    let result = retry_async(
        &ctx.settings.retry,
        "embed",
        PipelineError::is_retryable,
        |_| async move {
            match tokio::time::timeout(timeout, ctx.embedder.embed(query)).await {
                Ok(Ok(embedding)) => Ok(embedding),
                Ok(Err(err)) => Err(PipelineError::Embedding(err)),
                Err(_) => Err(PipelineError::EmbeddingTimeout(timeout)),
            }
        },
    )
    .await;

    if let Err(err) = &result.result {
        tracing::error!(attempts = result.attempts, error = %err, "embedding failed");
    }
    result.into_result()
}

async fn query_with_policy(
    ctx: &AppContext,
    request: &QueryRequest,
) -> Result<QueryResponse, PipelineError> {
    let timeout = ctx.settings.query_timeout;
    let result = retry_async(
        &ctx.settings.retry,
        "index",
        PipelineError::is_retryable,
        |_| async move {
            match tokio::time::timeout(timeout, ctx.index.query(request)).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(err)) => Err(PipelineError::IndexQuery(err)),
                Err(_) => Err(PipelineError::IndexTimeout(timeout)),
            }
        },
    )
    .await;

    if let Err(err) = &result.result {
        tracing::error!(
            attempts = result.attempts,
            index = ctx.index.name(),
            error = %err,
            "index query failed"
        );
    }
    result.into_result()
}
