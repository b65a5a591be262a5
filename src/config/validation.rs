use crate::config::types::{AssetsConfig, AuditConfig, Config, HttpConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_audit_config(&config.audit)?;
    validate_http_config(&config.http)?;
    validate_assets_config(&config.assets)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates audit pipeline configuration
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    if config.mapping_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "mapping_path cannot be empty".to_string(),
        ));
    }

    validate_concurrency("link_check_concurrency", config.link_check_concurrency)?;
    validate_concurrency("size_lookup_concurrency", config.size_lookup_concurrency)?;

    if config.fetch_sizes && !config.collect_assets {
        return Err(ConfigError::Validation(
            "fetch_sizes requires collect_assets".to_string(),
        ));
    }

    Ok(())
}

fn validate_concurrency(name: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.check_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "check_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates asset extension list
fn validate_assets_config(config: &AssetsConfig) -> Result<(), ConfigError> {
    for ext in &config.extensions {
        validate_extension(ext)?;
    }
    Ok(())
}

/// Extensions are bare alphanumerics, no leading dot
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::Validation(
            "asset extension cannot be empty".to_string(),
        ));
    }

    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "asset extension '{}' must contain only letters and digits (no leading '.')",
            ext
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    if config.export_path.is_empty() {
        return Err(ConfigError::Validation(
            "export_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
