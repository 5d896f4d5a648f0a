//! Semantic product-image search.
//!
//! A user either types a text query or uploads an image. The query is
//! embedded with a cross-modal model, the vector is sent to a nearest-neighbour
//! index, and the ranked matches are laid out in a fixed-column grid.
//!
//! ```text
//! UserAction -> resolve_input -> Query -> Embedder -> VectorIndex -> ResultSet -> Grid
//! ```
//!
//! The embedder and index are long-lived handles held in an [`AppContext`]
//! built once at startup; every search borrows them read-only.

pub mod config;
pub mod resilience;

mod context;
mod error;
mod input;
mod pipeline;
mod view;

pub use crate::config::{ConfigLoadError, SearchConfig};
pub use crate::context::{AppContext, ContextError, PipelineSettings};
pub use crate::error::PipelineError;
pub use crate::input::{resolve_input, UserAction};
pub use crate::pipeline::{run_query, search, QueryOutcome};
pub use crate::resilience::RetryConfig;
pub use crate::view::SearchView;

pub use embed::{Embedder, EmbedError, Query, QueryEmbedding, QueryKind};
pub use index::{IndexError, Match, MatchMetadata, QueryRequest, QueryResponse, ResultSet, VectorIndex};
pub use render::{Cell, Grid};
