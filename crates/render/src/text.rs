//! Plain-text grid for terminals.

use crate::{Cell, Grid};

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Image {
            product_id,
            image_url,
            product_url,
        } => match product_url {
            Some(url) => format!("{product_id} {image_url} ({url})"),
            None => format!("{product_id} {image_url}"),
        },
        Cell::MissingImage { message, .. } => message.clone(),
    }
}

/// One line per row, cells separated by ` | `.
pub fn render_grid(grid: &Grid) -> String {
    grid.rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>().join(" | "))
        .collect::<Vec<_>>()
        .join("\n")
}
