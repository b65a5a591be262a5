//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{BatchState, BatchStatus, PageAudit, UrlFailure};
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt stored value in {table}: {value}")]
    CorruptValue { table: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A backend persists the [`BatchState`] so an interrupted batch can resume
/// from its first unprocessed URL.
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new batch run
    ///
    /// # Arguments
    ///
    /// * `mapping_hash` - Hash of the block mapping the run uses
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, mapping_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records a run's final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: BatchStatus,
        processed: usize,
        failed: usize,
    ) -> StorageResult<()>;

    // ===== Batch State =====

    /// Restores the accumulated batch state
    fn load_batch_state(&self) -> StorageResult<BatchState>;

    /// Writes one page's complete result and marks the URL processed
    ///
    /// Either everything is written or nothing is.
    fn commit_page(&mut self, url: &str, audit: &PageAudit) -> StorageResult<()>;

    /// Records (or replaces) the failure for a URL
    fn record_failure(&mut self, failure: &UrlFailure) -> StorageResult<()>;

    /// Number of processed URLs
    fn count_processed(&self) -> StorageResult<usize>;

    /// Explicit reset: clears processed URLs, rows and failures
    fn reset(&mut self) -> StorageResult<()>;
}
