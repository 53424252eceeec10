//! Configuration file parser for `smbc-config.json`.
//!
//! The three directives `feed_dir`, `feed_url` and `source_feed` are required.
//! Every missing one is reported, not just the first, so a fresh install can be
//! fixed in a single edit. The remaining keys are optional and fall back to the
//! behavior of a plain sequential run over the newest seven comics.
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// One or more required directives are absent or empty.
    #[error("{}", MissingKeys(.0))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

struct MissingKeys<'a>(&'a [&'static str]);

impl fmt::Display for MissingKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "ERROR: Missing the {} configuration directive", key)?;
        }
        Ok(())
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Name of the generated feed inside `feed_dir`.
pub const OUTPUT_FILE_NAME: &str = "smbc-rss.xml";

/// Number of source entries considered per run unless overridden.
pub const DEFAULT_ITEM_LIMIT: usize = 7;

/// What the pipeline does when a single entry cannot be fetched or extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run; the output file is left untouched.
    #[default]
    Abort,
    /// Log the failure and publish the remaining items.
    Skip,
}

/// Raw file contents before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    feed_dir: Option<String>,
    feed_url: Option<String>,
    source_feed: Option<String>,
    item_limit: Option<usize>,
    concurrency: Option<usize>,
    on_item_failure: Option<FailurePolicy>,
    request_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// Validated, immutable run configuration.
///
/// Built once at startup and handed by reference to each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory the output feed is written to. Always absolute.
    pub feed_dir: PathBuf,

    /// Public base URL `feed_dir` is served from, without trailing slash.
    pub feed_url: String,

    /// URL (or local path) of the upstream RSS/Atom feed.
    pub source_feed: String,

    /// Maximum number of source entries considered.
    pub item_limit: usize,

    /// Number of pages fetched at once. 1 keeps the run strictly sequential.
    pub concurrency: usize,

    pub on_item_failure: FailurePolicy,

    /// Per-request timeout. `None` leaves the HTTP client default in place.
    pub request_timeout_secs: Option<u64>,

    pub user_agent: String,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate configuration from a JSON file.
    ///
    /// - Missing or unreadable file → `Err(ConfigError::Io)`
    /// - Invalid JSON → `Err(ConfigError::Json)`
    /// - Absent or empty required keys → `Err(ConfigError::Missing)` listing all of them
    /// - Relative `feed_dir` → resolved against the current directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let meta = std::fs::metadata(path).map_err(io_err)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path).map_err(io_err)?;
        let base = std::env::current_dir().map_err(io_err)?;
        let config = Self::from_json(&content, &base)?;

        tracing::info!(
            path = %path.display(),
            feed_dir = %config.feed_dir.display(),
            source_feed = %config.source_feed,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration text. Relative `feed_dir` values are
    /// joined onto `base_dir`.
    pub fn from_json(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        if let Ok(serde_json::Value::Object(raw)) = serde_json::from_str(content) {
            let known_keys = [
                "feed_dir",
                "feed_url",
                "source_feed",
                "item_limit",
                "concurrency",
                "on_item_failure",
                "request_timeout_secs",
                "user_agent",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let raw: RawConfig = serde_json::from_str(content)?;

        let mut missing = Vec::new();
        let feed_dir = required("feed_dir", raw.feed_dir, &mut missing);
        let feed_url = required("feed_url", raw.feed_url, &mut missing);
        let source_feed = required("source_feed", raw.source_feed, &mut missing);

        let (Some(feed_dir), Some(feed_url), Some(source_feed)) = (feed_dir, feed_url, source_feed)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let item_limit = raw.item_limit.unwrap_or(DEFAULT_ITEM_LIMIT);
        if item_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "item_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        let concurrency = raw.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        if raw.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }

        let feed_dir = PathBuf::from(feed_dir);
        let feed_dir = if feed_dir.is_absolute() {
            feed_dir
        } else {
            base_dir.join(feed_dir)
        };

        Ok(Self {
            feed_dir,
            feed_url,
            source_feed,
            item_limit,
            concurrency,
            on_item_failure: raw.on_item_failure.unwrap_or_default(),
            request_timeout_secs: raw.request_timeout_secs,
            user_agent: raw
                .user_agent
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| format!("smbc-rss/{}", env!("CARGO_PKG_VERSION"))),
        })
    }

    /// Full path of the generated feed file.
    pub fn output_path(&self) -> PathBuf {
        self.feed_dir.join(OUTPUT_FILE_NAME)
    }

    /// Public URL the generated feed will be served from.
    pub fn public_feed_url(&self) -> String {
        format!("{}/{}", self.feed_url, OUTPUT_FILE_NAME)
    }
}

/// Returns the value with trailing slashes removed, recording `key` as missing
/// when it is absent or blank.
fn required(
    key: &'static str,
    value: Option<String>,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            let trimmed = v.trim().trim_end_matches('/');
            // "/" on its own still means the filesystem root
            Some(if trimmed.is_empty() { "/" } else { trimmed }.to_string())
        }
        _ => {
            missing.push(key);
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
