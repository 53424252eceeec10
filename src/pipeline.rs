//! The fetch → extract → publish run.
//!
//! A run reads the source feed once, visits at most `item_limit` comic pages,
//! and writes the output feed once at the end. Each page yields its own
//! `Result`; [`FailurePolicy`] decides whether a failed page ends the run or
//! is left out of the feed.
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::config::{Config, FailurePolicy};
use crate::content::{
    build_client, fetch_page, ExtractError, ExtractedItem, Extractor, FetchError,
};
use crate::feed::{read_source, write_feed, Channel, OutputError, SourceEntry, SourceError};

/// Why a single entry produced no item.
#[derive(Debug, Error)]
pub enum ItemFailureKind {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// A failed entry, identified by its link.
#[derive(Debug, Error)]
#[error("{link}: {kind}")]
pub struct ItemFailure {
    pub link: Url,
    #[source]
    pub kind: ItemFailureKind,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Selectors(#[from] ExtractError),

    /// A page failed under [`FailurePolicy::Abort`]; nothing was written.
    #[error("Aborting run, no feed written. {0}")]
    ItemFailed(ItemFailure),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub output_path: PathBuf,
    /// Published items in source-feed order.
    pub items: Vec<ExtractedItem>,
    /// Entries left out under [`FailurePolicy::Skip`], in source-feed order.
    pub failures: Vec<ItemFailure>,
}

/// Runs the whole pipeline with a client built from `config`.
pub async fn run(config: &Config) -> Result<RunSummary, PipelineError> {
    let client = build_client(config).map_err(PipelineError::Client)?;
    run_with_client(config, &client).await
}

/// Runs the whole pipeline with a caller-supplied HTTP client.
///
/// # Errors
///
/// - [`PipelineError::CreateDir`] - `feed_dir` could not be created; checked before any request
/// - [`PipelineError::Source`] - The source feed could not be read or has a malformed candidate
/// - [`PipelineError::ItemFailed`] - A page failed and the policy is `Abort`
/// - [`PipelineError::Output`] - The feed could not be written
///
/// On any error the previous output file, if one exists, is left untouched.
pub async fn run_with_client(
    config: &Config,
    client: &reqwest::Client,
) -> Result<RunSummary, PipelineError> {
    std::fs::create_dir_all(&config.feed_dir).map_err(|source| PipelineError::CreateDir {
        path: config.feed_dir.clone(),
        source,
    })?;

    let extractor = Extractor::new()?;
    let entries = read_source(client, &config.source_feed, config.item_limit).await?;
    tracing::info!(candidates = entries.len(), "Processing source entries");

    let (items, failures) = collect_items(
        client,
        &extractor,
        entries,
        config.concurrency,
        config.on_item_failure,
    )
    .await?;

    let output_path = config.output_path();
    let channel = Channel::smbc(Some(config.public_feed_url()));
    write_feed(&output_path, &channel, &items)?;

    Ok(RunSummary {
        output_path,
        items,
        failures,
    })
}

/// Processes entries through fetch and extraction, keeping source order.
///
/// At most `concurrency` pages are in flight. Under `Abort` the first failure
/// in source order stops the run and no further pages are started. Failures
/// are logged once, by the fetcher or the extraction step.
async fn collect_items(
    client: &reqwest::Client,
    extractor: &Extractor,
    entries: Vec<SourceEntry>,
    concurrency: usize,
    policy: FailurePolicy,
) -> Result<(Vec<ExtractedItem>, Vec<ItemFailure>), PipelineError> {
    let mut items = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();

    // `buffered` yields in input order regardless of completion order
    let mut outcomes = stream::iter(entries)
        .map(|entry| process_entry(client, extractor, entry))
        .buffered(concurrency.max(1));

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(item) => items.push(item),
            Err(failure) => match policy {
                FailurePolicy::Abort => return Err(PipelineError::ItemFailed(failure)),
                // Already logged where it failed
                FailurePolicy::Skip => failures.push(failure),
            },
        }
    }

    Ok((items, failures))
}

/// Fetches one page and extracts its item. A failed fetch is never handed to
/// the extractor.
async fn process_entry(
    client: &reqwest::Client,
    extractor: &Extractor,
    entry: SourceEntry,
) -> Result<ExtractedItem, ItemFailure> {
    let SourceEntry { link, published } = entry;

    let markup = match fetch_page(client, &link).await {
        Ok(markup) => markup,
        Err(e) => {
            return Err(ItemFailure {
                link,
                kind: e.into(),
            })
        }
    };

    let content = match extractor.extract(&markup, &link) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(link = %link, error = %e, "Failed to extract comic");
            return Err(ItemFailure {
                link,
                kind: e.into(),
            });
        }
    };

    tracing::info!(
        link = %link,
        comic = %content.comic_image_url,
        title = %content.hover_text,
        votey = %content.votey_image_url,
        "Extracted comic"
    );

    Ok(content.into_item(link, published))
}
