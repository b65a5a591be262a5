//! Audit coordinator - batch orchestration logic
//!
//! This module contains the batch loop that coordinates all aspects of an
//! audit run, including:
//! - Restoring batch state from storage
//! - Sequencing URLs one at a time through the page pipeline
//! - Committing each page's results atomically
//! - Recording failures and handling cancellation
//! - Run tracking and resumption

use crate::audit::fetcher::{PageSource, ScreenshotService};
use crate::audit::page::{AuditOptions, PagePipeline};
use crate::config::Config;
use crate::mapping::MappingLoader;
use crate::state::{BatchState, BatchStatus, PageAudit, UrlFailure};
use crate::storage::{RunRecord, Storage, StorageError};
use crate::Result;
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of one call to [`Auditor::run`]
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// Storage run ID, when a store is attached
    pub run_id: Option<i64>,
    /// URLs completed by this call
    pub processed: Vec<String>,
    /// URLs already processed by an earlier run
    pub skipped: Vec<String>,
    pub failed: Vec<UrlFailure>,
    /// The batch stopped early because cancellation was requested
    pub cancelled: bool,
}

/// Main audit coordinator structure
///
/// Owns the page pipeline, the optional persistence layer and the
/// [`BatchState`]. URLs are processed strictly one after another; only the
/// batch loop mutates the state.
pub struct Auditor {
    pipeline: PagePipeline,
    storage: Option<Box<dyn Storage>>,
    state: BatchState,
    status: BatchStatus,
}

impl Auditor {
    /// Creates an auditor with an empty in-memory batch state
    ///
    /// # Arguments
    ///
    /// * `config` - The application configuration
    /// * `mapping` - The loaded block mapping
    ///
    /// # Returns
    ///
    /// * `Ok(Auditor)` - Ready to run
    /// * `Err(AuditError)` - The HTTP client could not be built
    pub fn new(config: &Config, mapping: MappingLoader) -> Result<Self> {
        Ok(Self {
            pipeline: PagePipeline::new(config, mapping)?,
            storage: None,
            state: BatchState::new(),
            status: BatchStatus::Idle,
        })
    }

    /// Attaches persistence and restores the batch state it holds
    pub fn with_storage(mut self, storage: Box<dyn Storage>) -> Result<Self> {
        let state = storage.load_batch_state()?;

        if let Some(run) = storage.get_latest_run()? {
            if !state.is_empty() && run.mapping_hash != self.pipeline.mapping().hash() {
                tracing::warn!(
                    "Block mapping changed since run {}; resumed rows were extracted with the old mapping",
                    run.id
                );
            }
        }

        if !state.processed_urls.is_empty() {
            tracing::info!(
                "Restored batch state: {} processed URLs, {} pending failures",
                state.processed_urls.len(),
                state.failures.len()
            );
        }

        self.state = state;
        self.storage = Some(storage);
        Ok(self)
    }

    /// Starts from an existing in-memory state
    pub fn with_state(mut self, state: BatchState) -> Self {
        self.state = state;
        self
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.pipeline.set_options(options);
        self
    }

    pub fn with_page_source(mut self, source: Box<dyn PageSource>) -> Self {
        self.pipeline.set_page_source(source);
        self
    }

    pub fn with_screenshots(mut self, service: Box<dyn ScreenshotService>) -> Self {
        self.pipeline.set_screenshots(service);
        self
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn into_state(self) -> BatchState {
        self.state
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn options(&self) -> AuditOptions {
        self.pipeline.options()
    }

    pub fn mapping(&self) -> &MappingLoader {
        self.pipeline.mapping()
    }

    /// The most recent run recorded in storage
    pub fn latest_run(&self) -> Result<Option<RunRecord>> {
        match self.storage.as_ref() {
            Some(storage) => Ok(storage.get_latest_run()?),
            None => Ok(None),
        }
    }

    /// Explicit reset: forgets all processed URLs, rows and failures
    pub fn reset(&mut self) -> Result<()> {
        if let Some(storage) = self.storage.as_mut() {
            storage.reset()?;
        }
        self.state.reset();
        self.status = BatchStatus::Idle;
        Ok(())
    }

    /// Runs (or resumes) a batch over `urls`
    ///
    /// # Batch Flow
    ///
    /// 1. Input URLs are trimmed; blank lines and repeats are dropped
    /// 2. URLs already in `processed_urls` are skipped
    /// 3. Each remaining URL goes through the page pipeline
    /// 4. A completed page is committed (storage, then memory) as a whole
    /// 5. A failed page is recorded and the batch moves on
    /// 6. Cancellation stops before the next URL; an interrupted page is not
    ///    committed and stays eligible for the next run
    ///
    /// Only failures to create the run record are returned as errors.
    pub async fn run(&mut self, urls: &[String], cancel: &CancellationToken) -> Result<BatchReport> {
        let urls = normalize_inputs(urls);

        let run_id = match self.storage.as_mut() {
            Some(storage) => Some(storage.create_run(self.pipeline.mapping().hash())?),
            None => None,
        };

        self.status = BatchStatus::Running;
        let mut report = BatchReport {
            run_id,
            ..Default::default()
        };

        let total = urls.len();
        let start_time = Instant::now();
        tracing::info!(
            "Starting batch of {} URLs ({} processed earlier)",
            total,
            urls.iter().filter(|u| self.state.is_processed(u)).count()
        );

        for (index, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("Batch cancelled before {}", url);
                report.cancelled = true;
                break;
            }

            if self.state.is_processed(url) {
                tracing::debug!("Skipping already processed URL: {}", url);
                report.skipped.push(url.clone());
                continue;
            }

            tracing::info!("[{}/{}] Auditing {}", index + 1, total, url);

            match self.pipeline.audit(url, cancel).await {
                Ok(Some(audit)) => match self.commit(url, audit) {
                    Ok(()) => report.processed.push(url.clone()),
                    Err(e) => {
                        tracing::error!("Failed to persist results for {}: {}", url, e);
                        report.failed.push(self.record_failure(
                            url,
                            format!("Failed to persist results: {}", e),
                        ));
                    }
                },
                Ok(None) => {
                    tracing::info!("Batch cancelled while auditing {}", url);
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    report.failed.push(self.record_failure(url, e.to_string()));
                }
            }
        }

        report.status = if report.failed.is_empty() && !report.cancelled {
            BatchStatus::Completed
        } else {
            BatchStatus::PartiallyCompleted
        };
        self.status = report.status;

        if let (Some(storage), Some(run_id)) = (self.storage.as_mut(), run_id) {
            if let Err(e) = storage.finish_run(
                run_id,
                report.status,
                report.processed.len(),
                report.failed.len(),
            ) {
                tracing::warn!("Failed to record end of run {}: {}", run_id, e);
            }
        }

        tracing::info!(
            "Batch {}: {} processed, {} skipped, {} failed in {:?}",
            report.status,
            report.processed.len(),
            report.skipped.len(),
            report.failed.len(),
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Commits a completed page: storage first, then memory
    fn commit(&mut self, url: &str, audit: PageAudit) -> std::result::Result<(), StorageError> {
        if let Some(storage) = self.storage.as_mut() {
            storage.commit_page(url, &audit)?;
        }

        tracing::debug!(
            "Committed {}: {} content rows, {} assets, {} broken links",
            url,
            audit.content_rows.len(),
            audit.asset_rows.len(),
            audit.link_rows.len()
        );
        self.state.commit(url, audit);
        Ok(())
    }

    fn record_failure(&mut self, url: &str, error: String) -> UrlFailure {
        let failure = UrlFailure {
            url: url.to_string(),
            error,
        };

        if let Some(storage) = self.storage.as_mut() {
            if let Err(e) = storage.record_failure(&failure) {
                tracing::warn!("Failed to persist failure for {}: {}", url, e);
            }
        }

        self.state.record_failure(failure.clone());
        failure
    }
}

/// Trims inputs, drops blanks and repeats, keeps first-seen order
fn normalize_inputs(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetsConfig, AuditConfig, HttpConfig, OutputConfig};
    use crate::storage::SqliteStorage;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const MAPPING: &str = r#"[
        {"name": "hero", "selector": ".hero", "components": {"Title": "h1"}}
    ]"#;

    /// Serves canned pages; unknown URLs answer 404
    struct StaticPages {
        pages: HashMap<String, String>,
        cancel_on: Option<(String, CancellationToken)>,
    }

    impl StaticPages {
        fn new(urls: &[&str]) -> Self {
            let pages = urls
                .iter()
                .map(|url| {
                    (
                        url.to_string(),
                        format!(r#"<div class="hero"><h1>Page {}</h1></div>"#, url),
                    )
                })
                .collect();
            Self {
                pages,
                cancel_on: None,
            }
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch_html(&self, url: &str) -> std::result::Result<String, FetchError> {
            if let Some((trigger, cancel)) = &self.cancel_on {
                if trigger == url {
                    cancel.cancel();
                }
            }
            self.pages.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    fn test_config() -> Config {
        Config {
            audit: AuditConfig {
                mapping_path: "mapping.json".to_string(),
                collect_assets: true,
                extract_blocks: true,
                check_links: false,
                fetch_sizes: false,
                link_check_concurrency: 10,
                size_lookup_concurrency: 1,
            },
            http: HttpConfig::default(),
            assets: AssetsConfig::default(),
            output: OutputConfig {
                database_path: "audit.db".to_string(),
                summary_path: "summary.md".to_string(),
                export_path: "export.json".to_string(),
            },
        }
    }

    fn auditor(source: StaticPages) -> Auditor {
        let mapping = MappingLoader::from_json_str(MAPPING).unwrap();
        Auditor::new(&test_config(), mapping)
            .unwrap()
            .with_page_source(Box::new(source))
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    const A: &str = "https://a.example.com/";
    const B: &str = "https://b.example.com/";
    const C: &str = "https://c.example.com/";

    #[tokio::test]
    async fn test_run_completes_all_urls() {
        let mut auditor = auditor(StaticPages::new(&[A, B, C]));
        let report = auditor
            .run(&urls(&[A, B, C]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.processed.len(), 3);
        assert_eq!(auditor.state().content_rows.len(), 3);
        assert_eq!(auditor.state().page_rows.len(), 3);
        assert_eq!(auditor.status(), BatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_url_does_not_abort_batch() {
        let mut auditor = auditor(StaticPages::new(&[A, C]));
        let report = auditor
            .run(&urls(&[A, B, C]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, BatchStatus::PartiallyCompleted);
        assert_eq!(report.processed, urls(&[A, C]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, B);
        assert_eq!(report.failed[0].error, "Failed to fetch https://b.example.com/: HTTP status 404");
        assert!(!auditor.state().is_processed(B));
        assert_eq!(auditor.state().failures.len(), 1);
    }

    #[tokio::test]
    async fn test_inputs_trimmed_and_deduplicated() {
        let mut auditor = auditor(StaticPages::new(&[A]));
        let input = vec![format!("  {}  ", A), String::new(), "   ".to_string(), A.to_string()];
        let report = auditor.run(&input, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.processed, urls(&[A]));
        assert_eq!(auditor.state().content_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_url_commits_nothing_for_it() {
        let cancel = CancellationToken::new();
        let mut source = StaticPages::new(&[A, B, C]);
        source.cancel_on = Some((B.to_string(), cancel.clone()));

        let mut auditor = auditor(source);
        let report = auditor.run(&urls(&[A, B, C]), &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.status, BatchStatus::PartiallyCompleted);
        assert_eq!(report.processed, urls(&[A]));
        assert!(!auditor.state().is_processed(B));
        assert!(auditor
            .state()
            .content_rows
            .iter()
            .all(|row| row.url == A));
    }

    #[tokio::test]
    async fn test_resume_matches_uninterrupted_run() {
        let mut uninterrupted = auditor(StaticPages::new(&[A, B, C]));
        uninterrupted
            .run(&urls(&[A, B, C]), &CancellationToken::new())
            .await
            .unwrap();

        let mut first = auditor(StaticPages::new(&[A, B, C]));
        first.run(&urls(&[A]), &CancellationToken::new()).await.unwrap();
        let partial = first.into_state();

        let mut resumed = auditor(StaticPages::new(&[A, B, C])).with_state(partial);
        let report = resumed
            .run(&urls(&[A, B, C]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.skipped, urls(&[A]));
        assert_eq!(report.processed, urls(&[B, C]));
        assert_eq!(
            resumed.state().content_rows,
            uninterrupted.state().content_rows
        );
        assert_eq!(
            resumed.state().processed_urls,
            uninterrupted.state().processed_urls
        );
    }

    #[tokio::test]
    async fn test_storage_restores_progress() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("audit.db");

        {
            let storage = SqliteStorage::new(&db_path).unwrap();
            let mut auditor = auditor(StaticPages::new(&[A, C]))
                .with_storage(Box::new(storage))
                .unwrap();
            auditor
                .run(&urls(&[A, B, C]), &CancellationToken::new())
                .await
                .unwrap();
        }

        let storage = SqliteStorage::new(&db_path).unwrap();
        let mut auditor = auditor(StaticPages::new(&[A, B, C]))
            .with_storage(Box::new(storage))
            .unwrap();
        assert!(auditor.state().is_processed(A));
        assert_eq!(auditor.state().failures.len(), 1);

        let report = auditor
            .run(&urls(&[A, B, C]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.processed, urls(&[B]));
        assert_eq!(report.skipped, urls(&[A, C]));
        assert_eq!(report.status, BatchStatus::Completed);
        assert!(auditor.state().failures.is_empty());
        assert_eq!(auditor.state().content_rows.len(), 3);
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_storage() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut auditor = auditor(StaticPages::new(&[A]))
            .with_storage(Box::new(storage))
            .unwrap();
        auditor
            .run(&urls(&[A]), &CancellationToken::new())
            .await
            .unwrap();

        auditor.reset().unwrap();
        assert!(auditor.state().is_empty());
        assert_eq!(auditor.status(), BatchStatus::Idle);

        let report = auditor
            .run(&urls(&[A]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.processed, urls(&[A]));
    }

    #[test]
    fn test_normalize_inputs() {
        let input = urls(&[" https://a.com ", "", "https://b.com", "https://a.com"]);
        assert_eq!(
            normalize_inputs(&input),
            urls(&["https://a.com", "https://b.com"])
        );
    }
}
