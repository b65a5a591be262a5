//! Storage module for persisting batch progress
//!
//! This module handles all database operations for the auditor, including:
//! - SQLite database initialization and schema management
//! - Atomic per-URL commits of audit rows
//! - Failure tracking for retry in a resumed run
//! - Run tracking and resumption support

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::BatchStatus;
use std::path::Path;

/// Initializes or opens a storage database
///
/// Parent directories are created when missing.
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::new(path)
}

/// Represents a batch run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub mapping_hash: String,
    pub status: BatchStatus,
    pub processed_count: usize,
    pub failed_count: usize,
}
