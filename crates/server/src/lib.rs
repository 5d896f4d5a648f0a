//! imgsearch server - web UI and JSON API for semantic image search
//!
//! Serves the search page (logo, header, text box, "Search with text" button,
//! image upload) and renders result grids in place. The same pipeline is
//! exposed as JSON for programmatic clients.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - search page
//! - `POST /search` - text search (form field `query`)
//! - `POST /search/image` - image search (multipart field `file`)
//! - `GET /api/v1` - API information
//! - `POST /api/v1/search` - text search, JSON in and out
//! - `POST /api/v1/search/image` - image search, multipart in, JSON out
//! - `GET /health` - liveness probe
//! - `GET /ready` - readiness probe

pub mod config;
pub mod error;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
