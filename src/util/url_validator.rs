use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a link taken from the source feed.
///
/// Only `http` and `https` links are fetched. Loopback and private hosts are
/// allowed since the source feed is operator-configured.
///
/// # Examples
///
/// ```
/// use smbc_rss::util::validate_url;
///
/// let url = validate_url("https://www.smbc-comics.com/comic/egg").unwrap();
/// assert_eq!(url.host_str(), Some("www.smbc-comics.com"));
///
/// assert!(validate_url("file:///etc/passwd").is_err());
/// assert!(validate_url("not a url").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

/// Resolves an attribute value such as an image `src` against the page it
/// was found on.
///
/// Absolute and blank values are returned exactly as written. Relative and
/// protocol-relative values are joined onto `base`.
pub fn resolve_against(base: &Url, raw: &str) -> Result<String, UrlValidationError> {
    // An empty reference would resolve to the page itself
    if raw.trim().is_empty() {
        return Ok(raw.to_string());
    }
    match Url::parse(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(base.join(raw)?.to_string()),
        Err(e) => Err(e.into()),
    }
}
