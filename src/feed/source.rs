use url::Url;

use super::parser::{parse_entries, SourceEntry, SourceError};
use crate::content::fetch_bytes;

/// Where the source feed is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(Url),
    File(String),
}

impl SourceLocation {
    /// `http(s)://` values are downloaded; `file://` URLs and bare paths are
    /// read from disk.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => SourceLocation::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => SourceLocation::File(path.to_string_lossy().into_owned()),
                Err(()) => SourceLocation::File(raw.to_string()),
            },
            _ => SourceLocation::File(raw.to_string()),
        }
    }
}

/// Reads the source feed and returns at most `limit` candidate entries.
pub async fn read_source(
    client: &reqwest::Client,
    source: &str,
    limit: usize,
) -> Result<Vec<SourceEntry>, SourceError> {
    let bytes = match SourceLocation::parse(source) {
        SourceLocation::Remote(url) => {
            tracing::info!(url = %url, "Fetching source feed");
            fetch_bytes(client, &url).await.map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Source feed request failed");
                SourceError::Fetch(e)
            })?
        }
        SourceLocation::File(path) => {
            tracing::info!(path = %path, "Reading source feed from file");
            tokio::fs::read(&path)
                .await
                .map_err(|source| SourceError::Io { path, source })?
        }
    };

    parse_entries(&bytes, limit)
}
