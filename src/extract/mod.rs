//! Document extraction module
//!
//! This module contains the synchronous, pure passes over a parsed page:
//! - Mapping-driven block extraction
//! - Asset discovery
//! - Gathering of outbound references for link checks
//!
//! None of these touch the network or batch state.

mod assets;
mod blocks;
mod links;

pub use assets::{AssetCollector, IMAGE_EXTENSIONS};
pub use blocks::{extract_blocks, BlockExtraction, BlockExtractor, BlockInstance};
pub use links::collect_link_targets;

use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector, turning the parser error into a message
pub fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("{:?}", e))
}

/// Collapses runs of whitespace to single spaces and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element
///
/// Text nodes are joined with a space, so `Oak<br>Chair` reads "Oak Chair".
pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|s| !s.is_empty())
}
