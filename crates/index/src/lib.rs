//! # imgsearch index clients
//!
//! Nearest-neighbor lookup over the product-image catalog. The pipeline only
//! sees the [`VectorIndex`] trait; two implementations ship with the crate:
//!
//! - [`PineconeIndex`] - the managed index the catalog lives in.
//! - [`MemoryIndex`] - a brute-force cosine index over a JSON catalog, for
//!   offline runs and tests.
//!
//! Responses are loosely typed on the wire ([`QueryResponse`], [`RawMatch`])
//! and validated into [`Match`]/[`MatchMetadata`] at this boundary, so code
//! downstream never touches untyped metadata.
//!
//! ## Example Usage
//!
//! ```
//! use index::{MemoryIndex, QueryRequest, VectorIndex};
//!
//! let catalog = r#"[{"id": "p-1", "values": [1.0, 0.0], "metadata": {"image_url": "https://cdn.example/p-1.jpg"}}]"#;
//! let index = MemoryIndex::from_json_str("demo", catalog).unwrap();
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let response = rt.block_on(index.query(&QueryRequest::new(vec![1.0, 0.0], 8))).unwrap();
//! let results = response.into_result_set().unwrap();
//! assert_eq!(results.get(0).unwrap().id, "p-1");
//! ```

mod error;
mod memory;
mod pinecone;
mod types;

use async_trait::async_trait;

pub use crate::error::IndexError;
pub use crate::memory::{CatalogRecord, MemoryIndex};
pub use crate::pinecone::{PineconeConfig, PineconeIndex, API_VERSION, DEFAULT_CONTROLLER_URL};
pub use crate::types::{
    Match, MatchMetadata, QueryRequest, QueryResponse, RawMatch, ResultSet, Usage, UNKNOWN_ID,
};

/// Index the product catalog was loaded into.
pub const DEFAULT_INDEX_NAME: &str = "image-search-hartlauer-crawled";

/// Number of matches requested per query.
pub const DEFAULT_TOP_K: usize = 8;

/// Read-only nearest-neighbor query contract.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the index, for logs and readiness reports.
    fn name(&self) -> &str;

    /// Up to `request.top_k` matches, best first.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, IndexError>;
}
