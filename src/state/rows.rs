//! Row types produced by an audit
//!
//! Every row is created while one URL is processed and is immutable
//! afterwards; rows only ever get appended to accumulators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One audited page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRow {
    pub url: String,
    pub title: Option<String>,
    /// Blank when no screenshot service is attached or it failed
    pub screenshot_url: Option<String>,
    /// RFC 3339 timestamp of when the page pipeline completed
    pub audited_at: String,
}

/// One extracted component value of one block instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub url: String,
    pub block_name: String,
    pub instance_id: String,
    pub component_name: String,
    /// Text content, or the (possibly resolved) attribute value
    pub value: String,
    pub source_element_tag: String,
    pub css_classes: String,
    pub readability_score: Option<f64>,
    pub grade_level: Option<f64>,
}

/// Size of an asset as recorded in an [`AssetRow`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FileSize {
    /// Size lookup was disabled
    NotRequested,
    /// Declared content length in kilobytes, rounded to two decimals
    Kilobytes(f64),
    /// Lookup was enabled but the size could not be determined
    Unavailable,
}

impl FileSize {
    pub const NOT_REQUESTED: &'static str = "N/A";
    pub const UNAVAILABLE: &'static str = "Unavailable";

    /// Converts a byte count to kilobytes rounded to two decimals
    pub fn from_bytes(bytes: u64) -> Self {
        Self::Kilobytes(round2(bytes as f64 / 1024.0))
    }

    /// Parses the text form written by [`fmt::Display`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            Self::NOT_REQUESTED => Some(Self::NotRequested),
            Self::UNAVAILABLE => Some(Self::Unavailable),
            other => other.parse::<f64>().ok().map(Self::Kilobytes),
        }
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => f.write_str(Self::NOT_REQUESTED),
            Self::Kilobytes(kb) => write!(f, "{}", kb),
            Self::Unavailable => f.write_str(Self::UNAVAILABLE),
        }
    }
}

/// One discovered asset reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRow {
    pub source_page_url: String,
    /// Absolute URL, unique within one page's asset set
    pub asset_url: String,
    /// `"Image"` or `"Document"`, with the extension when known
    pub asset_type: String,
    pub link_text: String,
    pub file_size: FileSize,
}

/// Outcome of a metadata request against a linked URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkStatus {
    /// Final HTTP status after redirects
    Http(u16),
    Timeout,
    ConnectionError,
    RequestError(String),
}

impl LinkStatus {
    pub const TIMEOUT: &'static str = "Timeout";
    pub const CONNECTION_ERROR: &'static str = "Connection Error";
    const REQUEST_ERROR_PREFIX: &'static str = "Error: ";

    /// Only a final 200 counts as healthy
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Http(200))
    }

    /// The numeric code, when there is one
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(*code),
            _ => None,
        }
    }

    /// Classifies a transport error from the HTTP client
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::ConnectionError
        } else {
            Self::RequestError(error.to_string())
        }
    }

    /// Parses the text form written by [`fmt::Display`]
    pub fn parse(s: &str) -> Self {
        if let Ok(code) = s.parse::<u16>() {
            return Self::Http(code);
        }
        match s {
            Self::TIMEOUT => Self::Timeout,
            Self::CONNECTION_ERROR => Self::ConnectionError,
            other => Self::RequestError(
                other
                    .strip_prefix(Self::REQUEST_ERROR_PREFIX)
                    .unwrap_or(other)
                    .to_string(),
            ),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{}", code),
            Self::Timeout => f.write_str(Self::TIMEOUT),
            Self::ConnectionError => f.write_str(Self::CONNECTION_ERROR),
            Self::RequestError(message) => write!(f, "{}{}", Self::REQUEST_ERROR_PREFIX, message),
        }
    }
}

/// One outbound reference that did not answer 200
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkStatusRow {
    pub source_page_url: String,
    pub linked_url: String,
    pub status: LinkStatus,
    /// Set when the link is also an extracted component value
    pub block_name: Option<String>,
    pub component_name: Option<String>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
