//! State module for tracking audit results
//!
//! This module provides the row types an audit produces and the batch-wide
//! accumulator that makes multi-URL runs resumable.
//!
//! # Components
//!
//! - `ContentRow`, `AssetRow`, `LinkStatusRow`, `PageRow`: immutable result rows
//! - `BatchState`: processed URLs plus append-only row accumulators
//! - `BatchStatus`: lifecycle of a batch run

mod batch_state;
mod batch_status;
mod rows;

// Re-export main types
pub use batch_state::{BatchState, PageAudit, UrlFailure};
pub use batch_status::BatchStatus;
pub use rows::{AssetRow, ContentRow, FileSize, LinkStatus, LinkStatusRow, PageRow};

pub(crate) use rows::round2;
