//! Utility functions for common operations.
//!
//! - **URL handling**: validating feed links and resolving scraped image sources
//! - **Text processing**: cleaning scraped text before it is written as XML
//!
//! # Examples
//!
//! ```
//! use smbc_rss::util::{collapse_whitespace, strip_control_chars, validate_url};
//!
//! let url = validate_url("https://www.smbc-comics.com/comic/egg").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! assert_eq!(strip_control_chars("hover\u{1}"), "hover");
//! assert_eq!(collapse_whitespace("  a \n b "), "a b");
//! ```

mod text;
mod url_validator;

pub use text::{collapse_whitespace, strip_control_chars};
pub use url_validator::{resolve_against, validate_url, UrlValidationError};
