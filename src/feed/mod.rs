//! Feed input and output.
//!
//! - [`parser`] - Turns the upstream RSS/Atom document into candidate entries
//! - [`source`] - Downloads the upstream feed (or reads it from disk)
//! - [`writer`] - Serializes extracted comics as an RSS 2.0 document
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{read_source, write_feed, Channel};
//!
//! let entries = read_source(&client, &config.source_feed, config.item_limit).await?;
//! // ... fetch and extract each entry ...
//! write_feed(&config.output_path(), &Channel::smbc(None), &items)?;
//! ```

mod parser;
mod source;
mod writer;

pub use parser::{parse_entries, parse_timestamp, SourceEntry, SourceError, PUB_DATE_FORMAT};
pub use source::{read_source, SourceLocation};
pub use writer::{item_description, render_rss, write_atomic, write_feed, Channel, OutputError};
