//! HTML fragments for the result grid.
//!
//! Everything interpolated into markup goes through [`escape`]; metadata comes
//! straight from the index and is untrusted.

use crate::{Cell, Grid};

/// Rendered image width in pixels.
pub const IMAGE_WIDTH: u32 = 150;

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Image {
            product_id,
            image_url,
            product_url,
        } => {
            let id = escape(product_id);
            let href = product_url
                .as_deref()
                .map(|url| format!(" href=\"{}\" target=\"_blank\"", escape(url)))
                .unwrap_or_default();
            format!(
                "<div class=\"cell\"><a href=\"{src}\" target=\"_blank\"><img src=\"{src}\" width=\"{IMAGE_WIDTH}\" alt=\"Product {id}\"></a><br><a{href}>Product ID: {id}</a></div>",
                src = escape(image_url),
            )
        }
        Cell::MissingImage { message, .. } => {
            format!("<div class=\"cell missing\"><p>{}</p></div>", escape(message))
        }
    }
}

/// One `<div class="row">` per grid row, cells in order.
pub fn render_grid(grid: &Grid) -> String {
    let mut out = String::from("<div class=\"grid\">");
    for row in &grid.rows {
        out.push_str("<div class=\"row\">");
        for cell in row {
            out.push_str(&render_cell(cell));
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

/// A status line such as the empty-result or validation message.
pub fn render_message(message: &str) -> String {
    format!("<p class=\"message\">{}</p>", escape(message))
}
