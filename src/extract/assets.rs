//! Asset discovery
//!
//! Finds documents and images a page links to. Size lookup is a separate,
//! networked step (see `audit::asset_sizes`); rows leave this module with
//! [`FileSize::NotRequested`].

use crate::config::AssetsConfig;
use crate::extract::element_text;
use crate::state::{AssetRow, FileSize};
use crate::url::{path_extension, resolve_reference};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extensions reported as `Image` rather than `Document`
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "avif", "bmp", "ico", "tif", "tiff",
];

/// Image source attributes in preference order (lazy-load first)
const IMAGE_SOURCE_ATTRIBUTES: &[&str] = &["data-src", "data-lazy-src", "src"];

/// Collects asset references from parsed pages
#[derive(Debug, Clone)]
pub struct AssetCollector {
    extensions: HashSet<String>,
}

impl AssetCollector {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::new(&config.extensions)
    }

    /// Collects the page's assets, deduplicated by absolute URL
    ///
    /// Fragments are dropped before deduplication. Anchors to a configured extension come first, then images, each in
    /// document order. The first reference to a URL decides its metadata.
    pub fn collect(&self, document: &Html, page_url: &Url) -> Vec<AssetRow> {
        let mut seen = HashSet::new();
        let mut assets = Vec::new();

        let mut push = |mut url: Url, asset_type: String, link_text: String| {
            url.set_fragment(None);
            if seen.insert(url.to_string()) {
                assets.push(AssetRow {
                    source_page_url: page_url.to_string(),
                    asset_url: url.to_string(),
                    asset_type,
                    link_text,
                    file_size: FileSize::NotRequested,
                });
            }
        };

        if let Ok(selector) = Selector::parse("a[href]") {
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                let Some(url) = resolve_reference(href, page_url) else {
                    continue;
                };
                let Some(ext) = path_extension(&url).filter(|ext| self.extensions.contains(ext))
                else {
                    continue;
                };

                push(url, asset_type(Some(ext.as_str())), element_text(&element));
            }
        }

        if let Ok(selector) = Selector::parse("img") {
            for element in document.select(&selector) {
                let Some(url) = image_source(&element, page_url) else {
                    continue;
                };
                let ext = path_extension(&url);
                let alt = element.value().attr("alt").unwrap_or_default().trim();

                push(url, image_type(ext.as_deref()), alt.to_string());
            }
        }

        tracing::debug!("Found {} assets on {}", assets.len(), page_url);
        assets
    }
}

/// First usable image source, preferring lazy-load attributes
fn image_source(element: &ElementRef, page_url: &Url) -> Option<Url> {
    IMAGE_SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find(|value| !value.trim().is_empty())
        .and_then(|value| resolve_reference(value, page_url))
}

fn asset_type(ext: Option<&str>) -> String {
    match ext {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => format!("Image ({})", ext),
        Some(ext) => format!("Document ({})", ext),
        None => "Document".to_string(),
    }
}

fn image_type(ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("Image ({})", ext),
        None => "Image".to_string(),
    }
}
