//! URL handling module for Content-Audit
//!
//! This module resolves references found in audited pages: anchors, media
//! sources and extracted attribute values.

mod resolve;

// Re-export main functions
pub use resolve::{is_http_url, path_extension, resolve_component_value, resolve_reference};

use url::Url;

/// Parses a page URL supplied by the caller
///
/// Input lines are trimmed; only HTTP(S) URLs are auditable.
pub fn parse_page_url(input: &str) -> Option<Result<Url, url::ParseError>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    Some(Url::parse(input))
}
