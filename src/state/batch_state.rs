use crate::state::rows::{AssetRow, ContentRow, LinkStatusRow, PageRow};
use crate::SelectorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything one URL's pipeline produced
///
/// A page result is committed to the batch as a whole or not at all.
#[derive(Debug, Clone, Default)]
pub struct PageAudit {
    pub page: Option<PageRow>,
    pub content_rows: Vec<ContentRow>,
    pub asset_rows: Vec<AssetRow>,
    pub link_rows: Vec<LinkStatusRow>,
    /// Rules skipped on this page because their selector failed
    pub selector_errors: Vec<SelectorError>,
}

impl PageAudit {
    /// URL of the audited page
    pub fn url(&self) -> Option<&str> {
        self.page.as_ref().map(|page| page.url.as_str())
    }
}

/// A URL whose pipeline did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

/// Process-wide accumulation across a multi-URL run
///
/// Mutated only by the auditor between URL pipelines; the accumulators are
/// append-only and cleared only by [`BatchState::reset`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchState {
    pub processed_urls: HashSet<String>,
    pub page_rows: Vec<PageRow>,
    pub content_rows: Vec<ContentRow>,
    pub asset_rows: Vec<AssetRow>,
    pub link_rows: Vec<LinkStatusRow>,
    /// Latest failure per URL still awaiting a successful retry
    pub failures: Vec<UrlFailure>,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url)
    }

    /// Appends a completed page and marks its URL processed
    ///
    /// Any earlier failure recorded for the URL is cleared.
    pub fn commit(&mut self, url: &str, audit: PageAudit) {
        self.failures.retain(|failure| failure.url != url);

        if let Some(page) = audit.page {
            self.page_rows.push(page);
        }
        self.content_rows.extend(audit.content_rows);
        self.asset_rows.extend(audit.asset_rows);
        self.link_rows.extend(audit.link_rows);
        self.processed_urls.insert(url.to_string());
    }

    /// Records (or replaces) the failure for a URL
    pub fn record_failure(&mut self, failure: UrlFailure) {
        self.failures.retain(|existing| existing.url != failure.url);
        self.failures.push(failure);
    }

    /// Explicit reset: forget every processed URL and row
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.processed_urls.is_empty() && self.failures.is_empty()
    }
}
