//! Link health checking
//!
//! Every outbound reference of a page gets one HEAD request through a
//! [`WorkerPool`]. Only references whose final status is not 200 produce a
//! [`LinkStatusRow`].

use crate::audit::pool::{TaskError, WorkerPool};
use crate::extract::collect_link_targets;
use crate::state::{ContentRow, LinkStatus, LinkStatusRow};
use crate::url::resolve_reference;
use reqwest::Client;
use scraper::Html;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Checks outbound references with bounded concurrency
#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
    timeout: Duration,
    pool: WorkerPool,
}

impl LinkChecker {
    pub fn new(client: Client, timeout: Duration, pool: WorkerPool) -> Self {
        Self {
            client,
            timeout,
            pool,
        }
    }

    /// Checks every URL, returning one status per completed check
    ///
    /// Results keep input order. Checks dropped by cancellation are left out.
    pub async fn check_urls(&self, urls: Vec<Url>) -> Vec<(Url, LinkStatus)> {
        let client = self.client.clone();
        let timeout = self.timeout;

        let outcomes = self
            .pool
            .run(urls, move |url: Url| {
                let client = client.clone();
                async move { check_link(&client, &url, timeout).await }
            })
            .await;

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.result {
                Ok(status) => Some((outcome.item, status)),
                Err(TaskError::Cancelled) => None,
                Err(TaskError::Panicked(message)) => {
                    Some((outcome.item, LinkStatus::RequestError(message)))
                }
            })
            .collect()
    }

    /// Checks a page's references and builds rows for the unhealthy ones
    ///
    /// Rows are correlated with `content_rows` of the same page when a
    /// component value points at the checked URL.
    pub async fn check_targets(
        &self,
        page_url: &Url,
        targets: Vec<Url>,
        content_rows: &[ContentRow],
    ) -> Vec<LinkStatusRow> {
        let checked = targets.len();
        let results = self.check_urls(targets).await;
        let rows = correlate_links(page_url, results, content_rows);

        tracing::info!(
            "Checked {} links on {}: {} not OK",
            checked,
            page_url,
            rows.len()
        );
        rows
    }

    /// Gathers and checks every reference of a parsed page
    pub async fn check_page(&self, document: &Html, page_url: &Url) -> Vec<LinkStatusRow> {
        let targets = collect_link_targets(document, page_url);
        self.check_targets(page_url, targets, &[]).await
    }
}

/// Issues a HEAD request and classifies the outcome
///
/// | Condition | Status |
/// |-----------|--------|
/// | Response (after redirects) | `Http(code)` |
/// | Timeout | `Timeout` |
/// | Connection refused / DNS | `ConnectionError` |
/// | Anything else | `RequestError(message)` |
pub async fn check_link(client: &Client, url: &Url, timeout: Duration) -> LinkStatus {
    match client.head(url.clone()).timeout(timeout).send().await {
        Ok(response) => LinkStatus::Http(response.status().as_u16()),
        Err(e) => {
            let status = LinkStatus::from_reqwest(&e);
            tracing::debug!("Link check failed for {}: {}", url, e);
            status
        }
    }
}

/// Keeps the non-OK results and attaches block/component names
pub fn correlate_links(
    page_url: &Url,
    results: Vec<(Url, LinkStatus)>,
    content_rows: &[ContentRow],
) -> Vec<LinkStatusRow> {
    let mut components: HashMap<String, &ContentRow> = HashMap::new();
    for row in content_rows {
        if let Some(mut url) = resolve_reference(&row.value, page_url) {
            url.set_fragment(None);
            components.entry(url.to_string()).or_insert(row);
        }
    }

    results
        .into_iter()
        .filter(|(_, status)| !status.is_ok())
        .map(|(url, status)| {
            let component = components.get(url.as_str());
            LinkStatusRow {
                source_page_url: page_url.to_string(),
                linked_url: url.to_string(),
                status,
                block_name: component.map(|row| row.block_name.clone()),
                component_name: component.map(|row| row.component_name.clone()),
            }
        })
        .collect()
}
