//! The pipeline run for a single URL
//!
//! Parsing and extraction happen synchronously on an owned copy of the HTML;
//! the parsed document never lives across an await point. Network work
//! (size lookups, link checks, screenshots) follows on the extracted data.

use crate::audit::asset_sizes::lookup_sizes;
use crate::audit::fetcher::{build_http_client, HttpPageSource, PageSource, ScreenshotService};
use crate::audit::link_checker::LinkChecker;
use crate::audit::pool::WorkerPool;
use crate::config::{AuditConfig, Config};
use crate::extract::{collect_link_targets, extract_title, AssetCollector, BlockExtractor};
use crate::mapping::MappingLoader;
use crate::state::{AssetRow, ContentRow, PageAudit, PageRow};
use crate::url::{is_http_url, parse_page_url};
use crate::{AuditError, SelectorError};
use chrono::Utc;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Which sub-pipelines run for each URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditOptions {
    pub collect_assets: bool,
    pub extract_blocks: bool,
    pub check_links: bool,
    /// Only takes effect together with `collect_assets`
    pub fetch_sizes: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            collect_assets: true,
            extract_blocks: true,
            check_links: false,
            fetch_sizes: false,
        }
    }
}

impl AuditOptions {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            collect_assets: config.collect_assets,
            extract_blocks: config.extract_blocks,
            check_links: config.check_links,
            fetch_sizes: config.fetch_sizes,
        }
    }
}

/// What the synchronous pass found on a page
#[derive(Debug, Clone, Default)]
pub struct PageAnalysis {
    pub title: Option<String>,
    pub content_rows: Vec<ContentRow>,
    pub asset_rows: Vec<AssetRow>,
    /// Empty unless link checking is enabled
    pub link_targets: Vec<Url>,
    pub selector_errors: Vec<SelectorError>,
}

/// Collaborators and settings for auditing one URL at a time
pub struct PagePipeline {
    mapping: MappingLoader,
    options: AuditOptions,
    assets: AssetCollector,
    client: Client,
    check_timeout: Duration,
    link_check_concurrency: usize,
    size_lookup_concurrency: usize,
    page_source: Box<dyn PageSource>,
    screenshots: Option<Box<dyn ScreenshotService>>,
}

impl PagePipeline {
    /// Builds a pipeline that fetches pages over HTTP
    pub fn new(config: &Config, mapping: MappingLoader) -> Result<Self, AuditError> {
        let client = build_http_client(&config.http)?;

        Ok(Self {
            mapping,
            options: AuditOptions::from_config(&config.audit),
            assets: AssetCollector::from_config(&config.assets),
            page_source: Box::new(HttpPageSource::new(client.clone())),
            client,
            check_timeout: Duration::from_secs(config.http.check_timeout_secs),
            link_check_concurrency: config.audit.link_check_concurrency as usize,
            size_lookup_concurrency: config.audit.size_lookup_concurrency as usize,
            screenshots: None,
        })
    }

    pub fn mapping(&self) -> &MappingLoader {
        &self.mapping
    }

    pub fn options(&self) -> AuditOptions {
        self.options
    }

    pub fn set_options(&mut self, options: AuditOptions) {
        self.options = options;
    }

    pub fn set_page_source(&mut self, source: Box<dyn PageSource>) {
        self.page_source = source;
    }

    pub fn set_screenshots(&mut self, service: Box<dyn ScreenshotService>) {
        self.screenshots = Some(service);
    }

    /// Runs every enabled sub-pipeline for one URL
    ///
    /// Returns `Ok(None)` when `cancel` fired before the page completed; no
    /// partial result is handed back in that case.
    pub async fn audit(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PageAudit>, AuditError> {
        let page_url = match parse_page_url(url) {
            Some(Ok(page_url)) => page_url,
            Some(Err(source)) => {
                return Err(AuditError::InvalidUrl {
                    url: url.to_string(),
                    source,
                })
            }
            None => {
                return Err(AuditError::UnsupportedScheme {
                    url: url.to_string(),
                })
            }
        };
        if !is_http_url(&page_url) {
            return Err(AuditError::UnsupportedScheme {
                url: url.to_string(),
            });
        }

        let html = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            result = self.page_source.fetch_html(page_url.as_str()) => {
                result.map_err(|source| AuditError::Fetch {
                    url: url.to_string(),
                    source,
                })?
            }
        };

        let analysis = self.analyze(&html, &page_url);
        drop(html);

        let mut asset_rows = analysis.asset_rows;
        if self.options.collect_assets && self.options.fetch_sizes && !asset_rows.is_empty() {
            let pool = WorkerPool::with_cancellation(self.size_lookup_concurrency, cancel.clone());
            asset_rows = lookup_sizes(&self.client, asset_rows, &pool, self.check_timeout).await;
        }
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let mut link_rows = Vec::new();
        if self.options.check_links && !analysis.link_targets.is_empty() {
            let checker = LinkChecker::new(
                self.client.clone(),
                self.check_timeout,
                WorkerPool::with_cancellation(self.link_check_concurrency, cancel.clone()),
            );
            link_rows = checker
                .check_targets(&page_url, analysis.link_targets, &analysis.content_rows)
                .await;
        }
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let screenshot_url = self.capture_screenshot(page_url.as_str()).await;

        Ok(Some(PageAudit {
            page: Some(PageRow {
                url: page_url.to_string(),
                title: analysis.title,
                screenshot_url,
                audited_at: Utc::now().to_rfc3339(),
            }),
            content_rows: analysis.content_rows,
            asset_rows,
            link_rows,
            selector_errors: analysis.selector_errors,
        }))
    }

    /// The synchronous part of a page audit
    pub fn analyze(&self, html: &str, page_url: &Url) -> PageAnalysis {
        let document = Html::parse_document(html);
        let mut analysis = PageAnalysis {
            title: extract_title(&document),
            ..Default::default()
        };

        if self.options.extract_blocks {
            let extraction = BlockExtractor::new(&self.mapping).extract(&document, page_url);
            analysis.content_rows = extraction.rows;
            analysis.selector_errors = extraction.errors;
        }

        if self.options.collect_assets {
            analysis.asset_rows = self.assets.collect(&document, page_url);
        }

        if self.options.check_links {
            analysis.link_targets = collect_link_targets(&document, page_url);
        }

        analysis
    }

    async fn capture_screenshot(&self, url: &str) -> Option<String> {
        let service = self.screenshots.as_ref()?;
        match service.capture(url).await {
            Ok(screenshot) if !screenshot.trim().is_empty() => Some(screenshot),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Screenshot failed for {}: {}", url, e);
                None
            }
        }
    }
}
