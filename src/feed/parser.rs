use chrono::{DateTime, Utc, Weekday};
use feed_rs::parser;
use thiserror::Error;
use url::Url;

use crate::content::FetchError;
use crate::util::{validate_url, UrlValidationError};

/// Format of `<pubDate>` in the source feed, e.g. `Mon, 06 Jan 2025 12:00:00 +0000`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// [`PUB_DATE_FORMAT`] after the leading `%a, `.
const DATE_TIME_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Errors raised while reading the source feed. All of them end the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to download source feed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to read source feed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source feed could not be parsed: {0}")]
    Parse(String),

    #[error("Entry {index} in the source feed has no link")]
    MissingLink { index: usize },

    #[error("Entry {index} in the source feed has an invalid link: {source}")]
    InvalidLink {
        index: usize,
        #[source]
        source: UrlValidationError,
    },

    #[error("Entry {link} has no publication date in the expected RFC 822 format")]
    Timestamp { link: String },
}

/// One candidate comic page taken from the source feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub link: Url,
    pub published: DateTime<Utc>,
}

/// Parses a publication date in the fixed source format.
///
/// Returns `None` when the text does not match [`PUB_DATE_FORMAT`]. The
/// weekday must be a three-letter day name but is not checked against the
/// date, so `Tue, 06 Jan 2025` parses as January 6th.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let (weekday, rest) = raw.trim().split_once(", ")?;
    if weekday.len() != 3 || weekday.parse::<Weekday>().is_err() {
        return None;
    }
    DateTime::parse_from_str(rest, DATE_TIME_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses the source feed and returns its first `limit` entries in feed order.
///
/// Entries are never re-sorted by date: the source's own ordering decides
/// which entries are candidates. Entries past `limit` are not inspected, so a
/// malformed old entry cannot fail the run.
///
/// # Errors
///
/// - [`SourceError::Parse`] - Not a valid RSS or Atom document
/// - [`SourceError::MissingLink`] / [`SourceError::InvalidLink`] - A candidate has no usable link
/// - [`SourceError::Timestamp`] - A candidate's date is absent or not in [`PUB_DATE_FORMAT`]
pub fn parse_entries(bytes: &[u8], limit: usize) -> Result<Vec<SourceEntry>, SourceError> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_timestamp)
        .build()
        .parse(bytes)
        .map_err(|e| SourceError::Parse(e.to_string()))?;

    let total = feed.entries.len();
    let entries = feed
        .entries
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| -> Result<SourceEntry, SourceError> {
            let href = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .ok_or(SourceError::MissingLink { index })?;
            let link =
                validate_url(&href).map_err(|source| SourceError::InvalidLink { index, source })?;
            let published = entry.published.ok_or_else(|| SourceError::Timestamp {
                link: link.to_string(),
            })?;
            Ok(SourceEntry { link, published })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        total = total,
        candidates = entries.len(),
        limit = limit,
        "Parsed source feed"
    );

    Ok(entries)
}
