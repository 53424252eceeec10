use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::util::{collapse_whitespace, resolve_against, strip_control_chars};

/// Main comic image. Its `title` attribute carries the hover text.
pub const COMIC_SELECTOR: &str = "#cc-comic";

/// Bonus panel shown after the comic.
pub const VOTEY_SELECTOR: &str = "#aftercomic > img";

const TITLE_SELECTOR: &str = "title";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector {selector}: {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },

    #[error("No element matches {0}")]
    MissingElement(&'static str),

    #[error("Element {element} has no {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Element {element} has an unusable {attribute} URL: {reason}")]
    InvalidUrl {
        element: &'static str,
        attribute: &'static str,
        reason: String,
    },
}

/// Everything the output feed needs from one comic page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub page_title: String,
    pub link: Url,
    pub comic_image_url: String,
    pub hover_text: String,
    pub votey_image_url: String,
    pub published: DateTime<Utc>,
}

/// The fields scraped from a page, before they are tied to a feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub comic_image_url: String,
    pub hover_text: String,
    pub votey_image_url: String,
}

impl PageContent {
    pub fn into_item(self, link: Url, published: DateTime<Utc>) -> ExtractedItem {
        ExtractedItem {
            page_title: self.title,
            link,
            comic_image_url: self.comic_image_url,
            hover_text: self.hover_text,
            votey_image_url: self.votey_image_url,
            published,
        }
    }
}

/// Compiled selectors for an SMBC comic page.
///
/// Build once per run and reuse for every page.
#[derive(Debug)]
pub struct Extractor {
    title: Selector,
    comic: Selector,
    votey: Selector,
}

fn compile(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector,
        reason: e.to_string(),
    })
}

impl Extractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            title: compile(TITLE_SELECTOR)?,
            comic: compile(COMIC_SELECTOR)?,
            votey: compile(VOTEY_SELECTOR)?,
        })
    }

    /// Extracts the page title, comic image, hover text and votey image.
    ///
    /// All four are required; the first one missing fails the whole page.
    /// Attribute values are kept verbatim except that relative image sources
    /// are resolved against `page_url`.
    pub fn extract(&self, markup: &str, page_url: &Url) -> Result<PageContent, ExtractError> {
        let document = Html::parse_document(markup);

        let title = document
            .select(&self.title)
            .next()
            .ok_or(ExtractError::MissingElement(TITLE_SELECTOR))?
            .text()
            .collect::<String>();
        let title = collapse_whitespace(&strip_control_chars(&title));

        let comic = document
            .select(&self.comic)
            .next()
            .ok_or(ExtractError::MissingElement(COMIC_SELECTOR))?;
        let hover_text = strip_control_chars(attr(comic, COMIC_SELECTOR, "title")?).into_owned();
        let comic_image_url = image_src(comic, COMIC_SELECTOR, page_url)?;

        let votey = document
            .select(&self.votey)
            .next()
            .ok_or(ExtractError::MissingElement(VOTEY_SELECTOR))?;
        let votey_image_url = image_src(votey, VOTEY_SELECTOR, page_url)?;

        Ok(PageContent {
            title,
            comic_image_url,
            hover_text,
            votey_image_url,
        })
    }
}

fn attr<'a>(
    element: ElementRef<'a>,
    selector: &'static str,
    name: &'static str,
) -> Result<&'a str, ExtractError> {
    element
        .value()
        .attr(name)
        .ok_or(ExtractError::MissingAttribute {
            element: selector,
            attribute: name,
        })
}

fn image_src(
    element: ElementRef<'_>,
    selector: &'static str,
    page_url: &Url,
) -> Result<String, ExtractError> {
    let src = attr(element, selector, "src")?;
    resolve_against(page_url, src).map_err(|e| ExtractError::InvalidUrl {
        element: selector,
        attribute: "src",
        reason: e.to_string(),
    })
}
