//! Canonical form for target URLs accepted by the shortener.

use url::Url;

/// Longest target URL accepted, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Parses `input` and returns it in canonical form.
///
/// The host is lowercased, a default port (80/443) and any fragment are
/// dropped. Path and query are kept verbatim. Schemes other than http and
/// https are rejected.
///
/// # Examples
///
/// ```
/// use url_shortener_core::utils::url_normalizer::normalize_url;
///
/// assert_eq!(
///     normalize_url("HTTPS://Example.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// assert!(normalize_url("javascript:alert(1)").is_err());
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let mut url =
        Url::parse(trimmed).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    // The url crate already lowercases domain hosts for special schemes.
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url.to_string())
}
