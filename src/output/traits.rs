//! Output error types and the record-store interface
//!
//! A record store is any external tabular database that accepts rows as
//! field→value records and supports create-or-update keyed by a set of
//! fields. Uploads happen after a batch; their failures never touch the
//! results already held in memory.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record store rejected '{table}' record: {message}")]
    RecordStore { table: String, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One row as a flat field→value map; values are strings, numbers or null
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Trait for external record stores
///
/// Implementations create a record when no existing record matches all
/// `key_fields`, and update the matching record otherwise.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates or updates one record in `table`
    ///
    /// # Arguments
    ///
    /// * `table` - Destination table name
    /// * `record` - Field values, named after the table's columns
    /// * `key_fields` - Fields identifying an existing record
    async fn upsert(&self, table: &str, record: &Record, key_fields: &[&str]) -> OutputResult<()>;
}

/// Outcome of uploading one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub table: String,
    pub uploaded: usize,
    /// Row index and error message for every rejected record
    pub failures: Vec<(usize, String)>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
