//! Configuration module for Content-Audit
//!
//! This module handles loading, parsing, and validating the TOML application
//! configuration. The block mapping itself lives in [`crate::mapping`].
//!
//! # Example
//!
//! ```no_run
//! use content_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Mapping: {}", config.audit.mapping_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_asset_extensions, AssetsConfig, AuditConfig, Config, HttpConfig, OutputConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash};
