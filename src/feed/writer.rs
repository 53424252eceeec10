use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::ExtractedItem;

const RSS_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize feed: {0}")]
    Serialize(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn xml_err(e: impl std::fmt::Display) -> OutputError {
    OutputError::Serialize(e.to_string())
}

/// Channel-level metadata of the generated feed.
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub generator: String,
    /// Where the generated file is published, advertised as `atom:link rel="self"`.
    pub self_link: Option<String>,
    pub last_build_date: DateTime<Utc>,
}

impl Channel {
    /// Metadata for the SMBC feed, built now.
    pub fn smbc(self_link: Option<String>) -> Self {
        Self {
            title: "Saturday Morning Breakfast Cereal".to_string(),
            link: "https://www.smbc-comics.com/".to_string(),
            description: "RSS feed for Saturday Morning Breakfast Cereal".to_string(),
            language: "en-US".to_string(),
            generator: format!(
                "smbc-rss {} {}",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_REPOSITORY")
            ),
            self_link,
            last_build_date: Utc::now(),
        }
    }
}

/// HTML body of an item: comic, hover text, then the votey image.
pub fn item_description(item: &ExtractedItem) -> String {
    [
        format!(
            r#"<p><img src="{}" alt="Main comic"></p>"#,
            escape(item.comic_image_url.as_str())
        ),
        format!("<p>Hover Text: {}</p>", escape(item.hover_text.as_str())),
        format!(
            r#"<p><img src="{}" alt="Extra joke"></p>"#,
            escape(item.votey_image_url.as_str())
        ),
    ]
    .join("\n")
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), OutputError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Serializes the channel and its items as an RSS 2.0 document.
///
/// Items are written in the order given.
pub fn render_rss(channel: &Channel, items: &[ExtractedItem]) -> Result<String, OutputError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss)).map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(xml_err)?;

    write_text_element(&mut writer, "title", &channel.title)?;
    write_text_element(&mut writer, "link", &channel.link)?;
    write_text_element(&mut writer, "description", &channel.description)?;
    if let Some(ref self_link) = channel.self_link {
        let mut atom_link = BytesStart::new("atom:link");
        atom_link.push_attribute(("href", self_link.as_str()));
        atom_link.push_attribute(("rel", "self"));
        atom_link.push_attribute(("type", "application/rss+xml"));
        writer.write_event(Event::Empty(atom_link)).map_err(xml_err)?;
    }
    write_text_element(&mut writer, "language", &channel.language)?;
    write_text_element(
        &mut writer,
        "lastBuildDate",
        &channel.last_build_date.format(RSS_DATE_FORMAT).to_string(),
    )?;
    write_text_element(&mut writer, "generator", &channel.generator)?;

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(xml_err)?;

        write_text_element(&mut writer, "title", &item.page_title)?;
        write_text_element(&mut writer, "link", item.link.as_str())?;
        write_text_element(&mut writer, "description", &item_description(item))?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(item.link.as_str())))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .map_err(xml_err)?;

        write_text_element(
            &mut writer,
            "pubDate",
            &item.published.format(RSS_DATE_FORMAT).to_string(),
        )?;

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(xml_err)?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(xml_err)
}

/// Writes `content` to `path`, replacing the file atomically.
///
/// The content goes to a temporary file in the same directory, is synced to
/// disk, then renamed over `path`. Readers see either the previous feed or
/// the complete new one.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), OutputError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Randomized temp filename so two runs never share a temp file
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(io_err)?;

    let written = std::io::Write::write_all(&mut file, content.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(io_err(e));
    }

    #[cfg(windows)]
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }
    }

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        io_err(e)
    })
}

/// Renders the feed and writes it to `path`.
pub fn write_feed(
    path: &Path,
    channel: &Channel,
    items: &[ExtractedItem],
) -> Result<(), OutputError> {
    let content = render_rss(channel, items)?;
    write_atomic(path, &content)?;
    tracing::info!(path = %path.display(), items = items.len(), "Wrote feed");
    Ok(())
}
