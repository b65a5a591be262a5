use url::Url;

/// Schemes that never point at something an HTTP check could reach
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a reference found in a page to an absolute HTTP(S) URL
///
/// Returns None if the reference should be excluded:
/// - empty values
/// - javascript:, mailto:, tel:, data: schemes
/// - pure in-page fragments (`#section`)
/// - anything that is not HTTP(S) after resolution
///
/// # Examples
///
/// ```
/// use content_audit::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/shop/").unwrap();
/// let url = resolve_reference("../about", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// assert!(resolve_reference("mailto:hi@example.com", &base).is_none());
/// ```
pub fn resolve_reference(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if is_http_url(&absolute) {
        Some(absolute)
    } else {
        None
    }
}

/// Resolves an extracted attribute value for a content row
///
/// Only site-relative paths (leading `/` or `../`) are resolved against the
/// page URL. Protocol-relative (`//cdn...`) and absolute values, and any
/// other text, pass through unchanged.
pub fn resolve_component_value(value: &str, page_url: &Url) -> String {
    let value = value.trim();

    let site_relative =
        (value.starts_with('/') && !value.starts_with("//")) || value.starts_with("../");
    if !site_relative {
        return value.to_string();
    }

    match page_url.join(value) {
        Ok(absolute) => absolute.to_string(),
        Err(e) => {
            tracing::debug!("Could not resolve '{}' against {}: {}", value, page_url, e);
            value.to_string()
        }
    }
}

/// Returns true for http and https URLs
pub fn is_http_url(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}

/// Lowercased extension of the last path segment, ignoring query and fragment
pub fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
