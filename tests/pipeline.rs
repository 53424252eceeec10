//! End-to-end runs against a mock SMBC site.
//!
//! Each test starts its own mock server serving a source feed plus comic pages,
//! and writes the output feed into a fresh temporary directory.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use smbc_rss::feed::PUB_DATE_FORMAT;
use smbc_rss::{run_with_client, Config, ConfigError, FailurePolicy, PipelineError};
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_feed(server: &MockServer, slugs: &[&str]) -> String {
    let items: String = slugs
        .iter()
        .enumerate()
        .map(|(i, slug)| {
            // Newest first, one comic per day counting back from Jan 20
            let date = Utc
                .with_ymd_and_hms(2025, 1, 20 - i as u32, 12, 0, 0)
                .unwrap()
                .format(PUB_DATE_FORMAT);
            format!(
                "<item><title>{slug}</title><link>{}/comic/{slug}</link><pubDate>{date}</pubDate></item>\n",
                server.uri()
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Saturday Morning Breakfast Cereal</title>
<link>{}</link>
<description>Latest comics</description>
{items}</channel></rss>"#,
        server.uri()
    )
}

fn comic_page(slug: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Saturday Morning Breakfast Cereal - {slug}</title></head>
<body>
<div id="cc-comicbody"><img title="Hover text for {slug}" src="https://www.smbc-comics.com/comics/{slug}.png" id="cc-comic" /></div>
<div id="aftercomic"><img src="https://www.smbc-comics.com/comics/{slug}after.png"></div>
</body></html>"#
    )
}

async fn mount_source(server: &MockServer, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(source_feed(server, slugs), "application/rss+xml"),
        )
        .mount(server)
        .await;
}

async fn mount_pages(server: &MockServer, slugs: &[&str]) {
    for slug in slugs {
        Mock::given(method("GET"))
            .and(path(format!("/comic/{slug}")))
            .respond_with(ResponseTemplate::new(200).set_body_raw(comic_page(slug), "text/html"))
            .mount(server)
            .await;
    }
}

fn config(server: &MockServer, feed_dir: &Path, extra: &str) -> Config {
    let json = format!(
        r#"{{
            "feed_dir": "{}",
            "feed_url": "https://example.com/feeds/",
            "source_feed": "{}/rss"{extra}
        }}"#,
        feed_dir.display(),
        server.uri()
    );
    Config::from_json(&json, feed_dir).unwrap()
}

fn parse_output(path: &Path) -> feed_rs::model::Feed {
    let bytes = std::fs::read(path).unwrap();
    feed_rs::parser::parse(bytes.as_slice()).unwrap()
}

#[tokio::test]
async fn test_only_first_seven_entries_fetched() {
    let server = MockServer::start().await;
    let slugs = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
    mount_source(&server, &slugs).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/comic/[a-i]$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(comic_page("x"), "text/html"))
        .expect(7)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), "");
    let summary = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap();

    assert_eq!(summary.items.len(), 7);
    let links: Vec<String> = summary.items.iter().map(|i| i.link.to_string()).collect();
    let expected: Vec<String> = slugs[..7]
        .iter()
        .map(|s| format!("{}/comic/{s}", server.uri()))
        .collect();
    assert_eq!(links, expected);
}

#[tokio::test]
async fn test_output_round_trips_through_feed_parser() {
    let server = MockServer::start().await;
    let slugs = ["egg", "bacon", "toast"];
    mount_source(&server, &slugs).await;
    mount_pages(&server, &slugs).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), "");
    let summary = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap();
    assert_eq!(summary.output_path, dir.path().join("smbc-rss.xml"));
    assert!(summary.failures.is_empty());

    let feed = parse_output(&summary.output_path);
    assert_eq!(feed.entries.len(), 3);
    for (i, (entry, slug)) in feed.entries.iter().zip(slugs).enumerate() {
        assert_eq!(
            entry.links[0].href,
            format!("{}/comic/{slug}", server.uri())
        );
        assert_eq!(
            entry.title.as_ref().unwrap().content,
            format!("Saturday Morning Breakfast Cereal - {slug}")
        );
        assert_eq!(
            entry.published.unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 20 - i as u32, 12, 0, 0).unwrap()
        );
        let summary_html = &entry.summary.as_ref().unwrap().content;
        assert!(summary_html.contains(&format!("Hover Text: Hover text for {slug}")));
        assert!(summary_html.contains(&format!("comics/{slug}after.png")));
    }
}

#[tokio::test]
async fn test_empty_source_writes_empty_feed() {
    let server = MockServer::start().await;
    mount_source(&server, &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), "");
    let summary = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap();

    assert!(summary.items.is_empty());
    let feed = parse_output(&summary.output_path);
    assert!(feed.entries.is_empty());
    assert_eq!(
        feed.title.unwrap().content,
        "Saturday Morning Breakfast Cereal"
    );
}

#[tokio::test]
async fn test_missing_comic_aborts_and_keeps_previous_feed() {
    let server = MockServer::start().await;
    mount_source(&server, &["good", "broken", "later"]).await;
    mount_pages(&server, &["good"]).await;
    Mock::given(method("GET"))
        .and(path("/comic/broken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><head><title>broken</title></head></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/comic/later"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(comic_page("later"), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("smbc-rss.xml");
    std::fs::write(&output, "previous feed").unwrap();

    let config = config(&server, dir.path(), "");
    let err = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::ItemFailed(_)));
    assert!(err.to_string().contains("#cc-comic"));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous feed");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_skip_policy_publishes_remaining_items() {
    let server = MockServer::start().await;
    mount_source(&server, &["good", "missing", "also-good"]).await;
    mount_pages(&server, &["good", "also-good"]).await;
    Mock::given(method("GET"))
        .and(path("/comic/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), r#", "on_item_failure": "skip""#);
    assert_eq!(config.on_item_failure, FailurePolicy::Skip);

    let summary = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap();

    assert_eq!(summary.items.len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].link.as_str().ends_with("/comic/missing"));

    let feed = parse_output(&summary.output_path);
    assert_eq!(feed.entries.len(), 2);
}

#[tokio::test]
async fn test_non_html_page_fails_entry() {
    let server = MockServer::start().await;
    mount_source(&server, &["json"]).await;
    Mock::given(method("GET"))
        .and(path("/comic/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), "");
    let err = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Not an HTML page"));
    assert!(!dir.path().join("smbc-rss.xml").exists());
}

#[tokio::test]
async fn test_output_dir_created() {
    let server = MockServer::start().await;
    mount_source(&server, &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("public").join("feeds");
    let config = config(&server, &nested, "");
    let summary = run_with_client(&config, &reqwest::Client::new())
        .await
        .unwrap();
    assert!(summary.output_path.starts_with(&nested));
    assert!(summary.output_path.exists());
}

#[tokio::test]
async fn test_missing_source_feed_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("smbc-config.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"feed_dir": "{}", "feed_url": "{}"}}"#,
            dir.path().display(),
            server.uri()
        ),
    )
    .unwrap();

    // Same gate as the binary: only a loaded config reaches the pipeline
    let err = match Config::load(&path) {
        Ok(config) => {
            let outcome = run_with_client(&config, &reqwest::Client::new()).await;
            panic!(
                "Config without source_feed loaded and ran: {:?}",
                outcome.map(|s| s.items.len())
            );
        }
        Err(e) => e,
    };
    assert!(matches!(err, ConfigError::Missing(ref keys) if keys == &vec!["source_feed"]));
    assert!(err.to_string().contains("source_feed"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert!(std::fs::read_dir(dir.path())
        .unwrap()
        .all(|e| e.unwrap().file_name() != "smbc-rss.xml"));
}
