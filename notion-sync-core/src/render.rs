//! Thread body composition.
//!
//! A published body is, line by line:
//!
//! ```text
//! <!-- page-id -->
//! <header note>
//! > Notion page URL: https://...      (empty line when the page has no URL)
//! <page markdown, routing block excluded>
//! ```

use crate::contract::Block;
use crate::markdown::to_markdown;

pub const DEFAULT_BRANDING: &str = "Notion";

/// Provenance note placed under the signature.
pub fn compose_header_note(branding: &str) -> String {
    format!("\n> This page is synced automatically from {branding}")
}

/// Back-link to the source page, or an empty string.
pub fn compose_link(url: Option<&str>) -> String {
    match url {
        Some(url) if !url.is_empty() => format!("> Notion page URL: {url}"),
        _ => String::new(),
    }
}

pub fn render_body(signature: &str, header_note: &str, url: Option<&str>, blocks: &[Block]) -> String {
    // The first block carries the routing directive and is never published.
    let content = blocks.get(1..).unwrap_or_default();
    format!(
        "{signature}\n{header_note}\n{link}\n{markdown}",
        link = compose_link(url),
        markdown = to_markdown(content),
    )
}
