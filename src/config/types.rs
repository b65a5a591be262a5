use serde::Deserialize;

/// Main configuration structure for Content-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audit: AuditConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    pub output: OutputConfig,
}

/// Which sub-pipelines run, and how hard they may hit remote hosts
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Path to the JSON block mapping
    #[serde(rename = "mapping-path")]
    pub mapping_path: String,

    #[serde(rename = "collect-assets", default = "default_true")]
    pub collect_assets: bool,

    #[serde(rename = "extract-blocks", default = "default_true")]
    pub extract_blocks: bool,

    #[serde(rename = "check-links", default)]
    pub check_links: bool,

    /// Issue a HEAD request per asset to record its size
    #[serde(rename = "fetch-sizes", default)]
    pub fetch_sizes: bool,

    /// Maximum number of in-flight link checks for one page
    #[serde(
        rename = "link-check-concurrency",
        default = "default_link_check_concurrency"
    )]
    pub link_check_concurrency: u32,

    /// Maximum number of in-flight asset size lookups for one page
    #[serde(
        rename = "size-lookup-concurrency",
        default = "default_size_lookup_concurrency"
    )]
    pub size_lookup_concurrency: u32,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout for fetching an audited page (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for a single link check or size lookup (seconds)
    #[serde(rename = "check-timeout-secs", default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: default_page_timeout(),
            check_timeout_secs: default_check_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Asset discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// File extensions (without the dot) that mark a link as an asset
    #[serde(default = "default_asset_extensions")]
    pub extensions: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            extensions: default_asset_extensions(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding resumable batch state
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,

    /// Path to the JSON table export
    #[serde(rename = "export-path")]
    pub export_path: String,
}

fn default_true() -> bool {
    true
}

fn default_link_check_concurrency() -> u32 {
    10
}

fn default_size_lookup_concurrency() -> u32 {
    1
}

fn default_page_timeout() -> u64 {
    20
}

fn default_check_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("content-audit/{}", env!("CARGO_PKG_VERSION"))
}

/// Document, archive and image extensions recognised as assets
pub fn default_asset_extensions() -> Vec<String> {
    [
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv", "txt", "rtf", "zip", "rar",
        "7z", "gz", "jpg", "jpeg", "png", "gif", "svg", "webp", "avif",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}
