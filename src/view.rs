//! Terminal states of one interaction, ready for any presentation layer.

use render::{
    layout, Grid, INVALID_QUERY_MESSAGE, NO_RESULTS_MESSAGE, SEARCH_FAILED_MESSAGE,
    UNREADABLE_IMAGE_MESSAGE,
};
use serde::{Deserialize, Serialize};

use crate::{PipelineError, QueryOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchView {
    /// Blank text; nothing was searched.
    Rejected { message: String },
    /// At least one match, laid out in rows.
    Results { grid: Grid },
    /// The index answered without matches.
    Empty { message: String },
    /// A collaborator failed or the upload was unreadable.
    Failed { message: String, retryable: bool },
}

impl SearchView {
    pub fn from_result(result: Result<QueryOutcome, PipelineError>, columns_per_row: usize) -> Self {
        match result {
            Ok(QueryOutcome::Matches(set)) => SearchView::Results {
                grid: layout(&set, columns_per_row),
            },
            Ok(QueryOutcome::Empty) => SearchView::Empty {
                message: NO_RESULTS_MESSAGE.to_string(),
            },
            Err(err) => SearchView::from_error(&err),
        }
    }

    pub fn from_error(err: &PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput => SearchView::Rejected {
                message: INVALID_QUERY_MESSAGE.to_string(),
            },
            PipelineError::ImageDecode(_) => SearchView::Failed {
                message: UNREADABLE_IMAGE_MESSAGE.to_string(),
                retryable: false,
            },
            other => SearchView::Failed {
                message: SEARCH_FAILED_MESSAGE.to_string(),
                retryable: other.is_retryable(),
            },
        }
    }

    /// The single status line of non-result states.
    pub fn message(&self) -> Option<&str> {
        match self {
            SearchView::Rejected { message }
            | SearchView::Empty { message }
            | SearchView::Failed { message, .. } => Some(message),
            SearchView::Results { .. } => None,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        match self {
            SearchView::Results { grid } => Some(grid),
            _ => None,
        }
    }
}
