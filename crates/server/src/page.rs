//! The search page.
//!
//! One template serves the empty form and every outcome: the header and both
//! input controls always render, followed by an optional upload preview and
//! the result section.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use imgsearch::config::UiYamlConfig;
use imgsearch::SearchView;
use render::html::{escape, render_grid, render_message};

use crate::upload::Upload;

/// Label of the text box.
pub const TEXT_LABEL: &str = "Enter your search query:";
/// Label of the upload control.
pub const UPLOAD_LABEL: &str = "Or upload an image to search";
/// Caption of the upload preview.
pub const PREVIEW_CAPTION: &str = "Uploaded Image";
/// Shown when the upload form is submitted without a file.
pub const NO_UPLOAD_MESSAGE: &str = "Please choose a jpg or png image to upload.";
/// Shown when the uploaded file is not jpg or png.
pub const UNSUPPORTED_UPLOAD_MESSAGE: &str = "Only jpg, jpeg and png images can be searched.";

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
.row{display:flex;gap:1rem;margin-bottom:1rem}\
.cell{flex:1 1 0;min-width:0}\
.message{font-weight:bold}\
figure img{max-width:100%}";

/// Everything below the input controls.
#[derive(Debug, Default)]
pub struct PageBody<'a> {
    /// Previous text query, echoed back into the text box.
    pub query: Option<&'a str>,
    pub preview: Option<&'a Upload>,
    pub view: Option<&'a SearchView>,
    /// Status line not produced by the pipeline (upload problems).
    pub notice: Option<&'a str>,
}

pub fn render_page(ui: &UiYamlConfig, body: PageBody<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    html.push_str(&format!("<title>{}</title>", escape(&ui.title)));
    html.push_str(&format!("<style>{STYLE}</style></head><body>"));

    if let Some(logo) = &ui.logo_url {
        html.push_str(&format!(
            "<img class=\"logo\" src=\"{}\" width=\"{}\" alt=\"logo\">",
            escape(logo),
            ui.logo_width
        ));
    }
    html.push_str(&format!("<h1>{}</h1>", escape(&ui.title)));
    html.push_str(&format!("<p>{}</p>", emphasize(&ui.description)));
    html.push_str("<h2>Demo</h2>");

    html.push_str(&format!(
        "<form method=\"post\" action=\"/search\">\
<label for=\"query\">{TEXT_LABEL}</label> \
<input type=\"text\" id=\"query\" name=\"query\" value=\"{}\"> \
<button type=\"submit\">Search with text</button></form>",
        escape(body.query.unwrap_or_default())
    ));
    html.push_str(&format!(
        "<form method=\"post\" action=\"/search/image\" enctype=\"multipart/form-data\">\
<label for=\"file\">{UPLOAD_LABEL}</label> \
<input type=\"file\" id=\"file\" name=\"file\" accept=\".jpg,.jpeg,.png\"> \
<button type=\"submit\">Search with image</button></form>"
    ));

    if let Some(upload) = body.preview {
        html.push_str(&format!(
            "<figure><img src=\"data:{};base64,{}\" alt=\"{PREVIEW_CAPTION}\"><figcaption>{PREVIEW_CAPTION}</figcaption></figure>",
            upload.preview_mime(),
            STANDARD.encode(&upload.bytes)
        ));
    }

    if let Some(notice) = body.notice {
        html.push_str(&render_message(notice));
    }

    if let Some(view) = body.view {
        html.push_str("<section id=\"results\">");
        match view {
            SearchView::Results { grid } => html.push_str(&render_grid(grid)),
            other => {
                if let Some(message) = other.message() {
                    html.push_str(&render_message(message));
                }
            }
        }
        html.push_str("</section>");
    }

    html.push_str("</body></html>");
    html
}

/// Escape `text` and turn `*word*` spans into `<em>`.
fn emphasize(text: &str) -> String {
    let escaped = escape(text);
    let mut out = String::with_capacity(escaped.len() + 16);
    let mut open = false;
    for (i, part) in escaped.split('*').enumerate() {
        if i > 0 {
            out.push_str(if open { "</em>" } else { "<em>" });
            open = !open;
        }
        out.push_str(part);
    }
    if open {
        out.push_str("</em>");
    }
    out
}
