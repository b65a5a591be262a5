//! Outbound reference gathering for link checks

use crate::url::resolve_reference;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Element/attribute pairs whose values are checked
///
/// Anchors and stylesheets contribute `href`; images, scripts and iframes
/// contribute `src`.
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("link[rel~='stylesheet'][href]", "href"),
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("iframe[src]", "src"),
];

/// Gathers every unique absolute URL a page references
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href>` and `<link rel="stylesheet" href>` targets
/// - `<img src>`, `<script src>` and `<iframe src>` sources
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Pure in-page fragments (`#top`)
/// - Anything that is not HTTP(S) after resolution
///
/// Fragments are stripped before deduplication, so `/faq#a` and `/faq#b`
/// are checked once. Results keep first-seen order.
///
/// # Example
///
/// ```
/// use content_audit::extract::collect_link_targets;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/page">Link</a><a href="mailto:x@y.z">Mail</a>"#);
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = collect_link_targets(&html, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn collect_link_targets(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for (selector, attribute) in LINK_SOURCES {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };

            if let Some(mut url) = resolve_reference(value, base_url) {
                url.set_fragment(None);
                if seen.insert(url.to_string()) {
                    links.push(url);
                }
            }
        }
    }

    links
}
