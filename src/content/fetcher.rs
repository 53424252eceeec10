use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;

const MAX_PAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while downloading a comic page or the source feed.
///
/// None of these are retried: each URL gets exactly one request per run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Any status other than the one the caller requires
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Page responded 200 but not with an HTML content type
    #[error("Not an HTML page (content type: {0})")]
    NotHtml(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

/// Builds the HTTP client shared by every request in a run.
///
/// No timeout is set unless `request_timeout_secs` is configured, leaving the
/// transport default in place.
pub fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Downloads a comic page and returns its markup.
///
/// Succeeds only for HTTP 200 with a `Content-Type` containing `html`
/// (case-insensitive). Every failure is logged here with the URL so callers
/// only need to decide what a failure means for the run.
///
/// # Errors
///
/// - [`FetchError::Network`] / [`FetchError::Timeout`] - Transport failure
/// - [`FetchError::HttpStatus`] - Any status other than 200
/// - [`FetchError::NotHtml`] - Missing or non-HTML content type
/// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
pub async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String, FetchError> {
    let result = fetch_html(client, url).await;
    if let Err(e) = &result {
        tracing::warn!(url = %url, error = %e, "Error during request");
    }
    result
}

async fn fetch_html(client: &reqwest::Client, url: &Url) -> Result<String, FetchError> {
    let response = client.get(url.clone()).send().await?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !content_type.contains("html") {
        return Err(FetchError::NotHtml(content_type));
    }

    let bytes = read_limited_bytes(response, MAX_PAGE_SIZE).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Downloads a document of any content type, requiring a 2xx status.
pub async fn fetch_bytes(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, MAX_PAGE_SIZE).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
