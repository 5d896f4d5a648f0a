//! Result rendering for imgsearch.
//!
//! Lays a [`ResultSet`] out row-major into a fixed-column [`Grid`]: match `i`
//! lands at row `i / columns`, column `i % columns`. Order is never changed.
//! Each match becomes a [`Cell`], which either shows the product image or, when
//! the index had no image URL for it, a fallback line naming the product id.
//!
//! Output formats: [`html`] for the web UI and [`text`] for the terminal.

pub mod html;
pub mod text;

use index::{Match, ResultSet};
use serde::{Deserialize, Serialize};

/// Columns per grid row.
pub const DEFAULT_COLUMNS_PER_ROW: usize = 4;

/// Shown instead of searching when the text box is blank.
pub const INVALID_QUERY_MESSAGE: &str = "Please enter a valid search query.";

/// Shown when the index returned no matches.
pub const NO_RESULTS_MESSAGE: &str = "No matching images found.";

/// Shown for external-call failures; the detail goes to the logs.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed, please try again.";

/// Shown when an upload does not decode as an image.
pub const UNREADABLE_IMAGE_MESSAGE: &str = "The uploaded file could not be read as an image.";

/// Fallback text for a match without an image.
pub fn missing_image_message(product_id: &str) -> String {
    format!("Image URL not found for Product ID: {product_id}.")
}

/// One grid slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    /// Clickable image plus a product link labelled with the id.
    Image {
        product_id: String,
        image_url: String,
        /// Rendered as-is; a missing value yields a link without a target.
        product_url: Option<String>,
    },
    /// Plain text fallback.
    MissingImage { product_id: String, message: String },
}

impl Cell {
    pub fn from_match(m: &Match) -> Self {
        match m.metadata.image_url.as_deref() {
            Some(image_url) => Cell::Image {
                product_id: m.id.clone(),
                image_url: image_url.to_string(),
                product_url: m.metadata.product_url.clone(),
            },
            None => Cell::MissingImage {
                product_id: m.id.clone(),
                message: missing_image_message(&m.id),
            },
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            Cell::Image { product_id, .. } | Cell::MissingImage { product_id, .. } => product_id,
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(self, Cell::Image { .. })
    }
}

/// Row-major layout of a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub columns_per_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells in display order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }

    /// Where the `idx`-th match of the result set ends up.
    pub fn position_of(&self, idx: usize) -> (usize, usize) {
        (idx / self.columns_per_row, idx % self.columns_per_row)
    }
}

/// Partition `results` into rows of `columns_per_row` cells; the last row may
/// be partial. A column count of zero is treated as one.
pub fn layout(results: &ResultSet, columns_per_row: usize) -> Grid {
    let columns_per_row = columns_per_row.max(1);
    let rows = results
        .as_slice()
        .chunks(columns_per_row)
        .map(|chunk| chunk.iter().map(Cell::from_match).collect())
        .collect();
    Grid {
        columns_per_row,
        rows,
    }
}
