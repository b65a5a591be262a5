//! Content-Audit: a mapping-driven web page auditor
//!
//! This crate audits web pages: for each URL it extracts the content blocks
//! described by a declarative mapping file, inventories linked assets, and
//! reports outbound links that do not answer with HTTP 200.

pub mod audit;
pub mod config;
pub mod extract;
pub mod mapping;
pub mod output;
pub mod readability;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Content-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Invalid page URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Not an http(s) page URL: '{url}'")]
    UnsupportedScheme { url: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Covers both the TOML application config and the JSON block mapping.
/// Any of these is fatal for the audit capability and surfaces before the
/// first URL is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Mapping resource not found: {}", .0.display())]
    MappingNotFound(PathBuf),

    #[error("Failed to parse mapping: {0}")]
    MappingParse(#[from] serde_json::Error),

    #[error("Invalid selector '{selector}' in rule '{rule}': {message}")]
    InvalidSelector {
        rule: String,
        selector: String,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Page retrieval errors
///
/// These never abort a batch: the URL is skipped, the failure recorded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Classifies a transport error from the HTTP client
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// A rule whose selector could not be evaluated on a page
///
/// The rule is skipped for that page; every other rule still applies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("rule '{rule}' skipped: selector '{selector}' is invalid ({message})")]
pub struct SelectorError {
    pub rule: String,
    pub selector: String,
    pub message: String,
}

/// Result type alias for Content-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use audit::{AuditOptions, Auditor, BatchReport};
pub use config::Config;
pub use mapping::{BlockRule, ExtractionKind, MappingLoader};
pub use state::{
    AssetRow, BatchState, BatchStatus, ContentRow, FileSize, LinkStatus, LinkStatusRow, PageRow,
    UrlFailure,
};
