//! Output module for exporting audit results
//!
//! This module handles:
//! - Flattening result rows into named, rectangular tables
//! - Exporting the tables as JSON
//! - Uploading rows to an external record store
//! - Generating markdown summaries and batch statistics

mod export;
mod markdown;
mod records;
pub mod stats;
mod table;
mod traits;

pub use export::{batch_tables, write_json_export};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use records::{upload_batch, upload_rows};
pub use stats::{load_statistics, print_statistics, AuditStatistics};
pub use table::{Cell, Table, TabularRow};
pub use traits::{OutputError, OutputResult, Record, RecordStore, UploadReport};
