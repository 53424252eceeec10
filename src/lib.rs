//! Republishes the Saturday Morning Breakfast Cereal feed with each comic's
//! image, hover text and bonus "votey" panel inlined into the item body.
//!
//! A run is a single pass: read the source feed, visit the pages of its first
//! entries in feed order, write `smbc-rss.xml` into the configured directory.

pub mod config;
pub mod content;
pub mod feed;
pub mod pipeline;
pub mod util;

pub use config::{Config, ConfigError, FailurePolicy};
pub use pipeline::{run, run_with_client, ItemFailure, PipelineError, RunSummary};
