//! Comic page retrieval and scraping.
//!
//! - [`fetcher`] - One GET per page, accepting only `200` HTML responses
//! - [`extractor`] - Pulls the title, comic, hover text and votey image out of the markup

mod extractor;
mod fetcher;

pub use extractor::{
    ExtractError, ExtractedItem, Extractor, PageContent, COMIC_SELECTOR, VOTEY_SELECTOR,
};
pub use fetcher::{build_client, fetch_bytes, fetch_page, FetchError};
