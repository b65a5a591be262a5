//! Audit module: everything that talks to the network
//!
//! This module contains the orchestration of a batch run, including:
//! - Page retrieval and the optional screenshot collaborator
//! - The per-URL pipeline (extract, collect, score, check)
//! - The bounded worker pool used for link checks and size lookups
//! - Resumable batch coordination

mod asset_sizes;
mod coordinator;
mod fetcher;
mod link_checker;
mod page;
mod pool;

pub use asset_sizes::{fetch_size, lookup_sizes};
pub use coordinator::{Auditor, BatchReport};
pub use fetcher::{build_http_client, HttpPageSource, PageSource, ScreenshotService};
pub use link_checker::{check_link, correlate_links, LinkChecker};
pub use page::{AuditOptions, PageAnalysis, PagePipeline};
pub use pool::{TaskError, TaskOutcome, WorkerPool};
