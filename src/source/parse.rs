//! RSS document parsing.
//!
//! Turns the raw bytes returned by a [`super::FeedSource`] into
//! [`NewsItem`]s.  Everything here is pure (no I/O) so tests can feed it
//! literal XML.
//!
//! Parsing is degraded-tolerant at every level:
//!
//! * a document that is not valid RSS yields an empty list, never an error;
//! * an entry without a title or link is skipped, the rest still parse;
//! * an unreadable date becomes [`Published::Unknown`], the item is kept.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{NewsItem, Published};

/// `pubDate` layout the feed actually emits (literal `GMT` zone), after the
/// leading weekday has been removed.
const DATE_FORMAT_GMT: &str = "%d %b %Y %H:%M:%S GMT";

/// RFC 822 layout with a numeric offset, tried when the literal form fails.
const DATE_FORMAT_OFFSET: &str = "%d %b %Y %H:%M:%S %z";

/// Parse a feed document into at most `max_items` news items.
///
/// Only the first `max_items` `<item>` entries (source order, newest first)
/// are considered; entries that fail validation inside that window are
/// dropped rather than replaced by later ones.
pub fn parse_feed(raw: &[u8], max_items: usize) -> Vec<NewsItem> {
    let channel = match rss::Channel::read_from(raw) {
        Ok(channel) => channel,
        Err(e) => {
            warn!("Could not parse feed document: {e}");
            return Vec::new();
        }
    };

    channel
        .items()
        .iter()
        .take(max_items)
        .filter_map(item_from_entry)
        .collect()
}

/// Normalise a single RSS entry, or `None` when it lacks a usable title or
/// link.
pub(crate) fn item_from_entry(entry: &rss::Item) -> Option<NewsItem> {
    let title = entry.title().map(str::trim).filter(|t| !t.is_empty());
    let link = entry
        .link()
        .map(str::trim)
        .filter(|l| Url::parse(l).is_ok());

    let (Some(title), Some(link)) = (title, link) else {
        debug!(
            "Skipping feed entry without title or link (title: {:?}, link: {:?})",
            entry.title(),
            entry.link()
        );
        return None;
    };

    let markup = entry.description().map(Html::parse_fragment);
    let description = markup.as_ref().map(plain_text).unwrap_or_default();

    let image_url = markup
        .as_ref()
        .and_then(|html| embedded_image(html, link))
        .or_else(|| media_content_image(entry))
        .or_else(|| enclosure_image(entry));

    let published = entry
        .pub_date()
        .map(parse_pub_date)
        .unwrap_or(Published::Unknown);

    Some(NewsItem {
        title: title.to_string(),
        link: link.to_string(),
        description,
        image_url,
        published,
    })
}

// ---------------------------------------------------------------------------
// Description markup
// ---------------------------------------------------------------------------

/// Visible text of an HTML fragment: text nodes trimmed and joined by single
/// spaces.
fn plain_text(html: &Html) -> String {
    html.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `src` of the first `<img>` in the description, resolved against the item
/// link when relative.
fn embedded_image(html: &Html, link: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    let src = html
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())?;

    match Url::parse(src) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(link)
            .and_then(|base| base.join(src))
            .ok()
            .map(|url| url.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Attached media
// ---------------------------------------------------------------------------

/// `url` attribute of the first `<media:content>` element.
fn media_content_image(entry: &rss::Item) -> Option<String> {
    entry
        .extensions()
        .get("media")?
        .get("content")?
        .iter()
        .filter_map(|ext| ext.attrs().get("url"))
        .map(|url| url.trim())
        .find(|url| !url.is_empty())
        .map(String::from)
}

/// `<enclosure>` URL, accepted only when its declared type is an image.
fn enclosure_image(entry: &rss::Item) -> Option<String> {
    let enclosure = entry.enclosure()?;
    let is_image = enclosure
        .mime_type()
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/");

    if is_image && !enclosure.url().trim().is_empty() {
        Some(enclosure.url().trim().to_string())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a `pubDate`, falling back to [`Published::Unknown`].
///
/// The weekday name is not checked against the date; feeds get it wrong
/// often enough that it is dropped before parsing.
fn parse_pub_date(raw: &str) -> Published {
    let raw = raw.trim();
    let dated = without_weekday(raw);

    if let Ok(naive) = NaiveDateTime::parse_from_str(dated, DATE_FORMAT_GMT) {
        return Published::At(naive.and_utc().fixed_offset());
    }

    match DateTime::<FixedOffset>::parse_from_str(dated, DATE_FORMAT_OFFSET) {
        Ok(dt) => Published::At(dt),
        Err(e) => {
            debug!("Unrecognised pubDate {raw:?}: {e}");
            Published::Unknown
        }
    }
}

/// `"Mon, 01 Jan 2024 ..."` -> `"01 Jan 2024 ..."`.  Input without a
/// leading weekday is returned as is.
fn without_weekday(raw: &str) -> &str {
    match raw.split_once(',') {
        Some((day, rest)) if day.chars().all(|c| c.is_ascii_alphabetic()) => rest.trim_start(),
        _ => raw,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    /// Wrap `<item>` bodies in a minimal RSS 2.0 document.
    fn feed(items: &[&str]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>Test</description>
"#,
        );
        for item in items {
            xml.push_str("    <item>");
            xml.push_str(item);
            xml.push_str("</item>\n");
        }
        xml.push_str("  </channel>\n</rss>\n");
        xml
    }

    #[test]
    fn parse_feed_extracts_items_in_source_order() {
        let xml = feed(&[
            r#"<title>Newest</title><link>https://example.com/2</link>
               <pubDate>Tue, 02 Jan 2024 12:00:00 GMT</pubDate>
               <description><![CDATA[<p>Second <b>post</b></p>]]></description>"#,
            r#"<title>Oldest</title><link>https://example.com/1</link>
               <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>"#,
        ]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Newest");
        assert_eq!(items[0].link, "https://example.com/2");
        assert_eq!(items[0].description, "Second post");
        assert!(matches!(items[0].published, Published::At(_)));
        assert_eq!(items[1].title, "Oldest");
        assert_eq!(items[1].description, "", "missing description is empty");
    }

    #[test]
    fn parse_feed_respects_max_items() {
        let xml = feed(&[
            "<title>A</title><link>https://example.com/a</link>",
            "<title>B</title><link>https://example.com/b</link>",
            "<title>C</title><link>https://example.com/c</link>",
        ]);

        let items = parse_feed(xml.as_bytes(), 2);

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn malformed_document_yields_no_items() {
        assert!(parse_feed(b"<html><body>Service Unavailable</body></html>", 10).is_empty());
        assert!(parse_feed(b"\x00\x01 not xml at all", 10).is_empty());
        assert!(parse_feed(b"", 10).is_empty());
    }

    #[test]
    fn entry_without_link_is_skipped_but_batch_continues() {
        let xml = feed(&[
            "<title>Has link</title><link>https://example.com/1</link>",
            "<title>No link</title>",
            "<title>Also has link</title><link>https://example.com/3</link>",
        ]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, "https://example.com/1");
        assert_eq!(items[1].link, "https://example.com/3");
    }

    #[test]
    fn entry_without_title_is_skipped() {
        let xml = feed(&[
            "<link>https://example.com/untitled</link>",
            "<title>   </title><link>https://example.com/blank</link>",
        ]);

        assert!(parse_feed(xml.as_bytes(), 10).is_empty());
    }

    #[test]
    fn image_from_description_wins() {
        let xml = feed(&[r#"<title>T</title><link>https://example.com/1</link>
            <description><![CDATA[<img src="https://cdn.example.com/desc.jpg"/> Body]]></description>
            <media:content url="https://cdn.example.com/media.jpg" medium="image"/>
            <enclosure url="https://cdn.example.com/enc.jpg" length="1" type="image/jpeg"/>"#]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/desc.jpg"));
        assert_eq!(items[0].description, "Body");
    }

    #[test]
    fn relative_description_image_resolves_against_link() {
        let xml = feed(&[r#"<title>T</title><link>https://example.com/news/1</link>
            <description><![CDATA[<img src="/uploads/pic.png">]]></description>"#]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items[0].image_url.as_deref(), Some("https://example.com/uploads/pic.png"));
    }

    #[test]
    fn image_falls_back_to_media_content() {
        let xml = feed(&[r#"<title>T</title><link>https://example.com/1</link>
            <description>No picture here</description>
            <media:content url="https://cdn.example.com/media.jpg" medium="image"/>
            <enclosure url="https://cdn.example.com/enc.jpg" length="1" type="image/jpeg"/>"#]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/media.jpg"));
    }

    #[test]
    fn image_falls_back_to_image_enclosure() {
        let xml = feed(&[r#"<title>T</title><link>https://example.com/1</link>
            <description>No picture here</description>
            <enclosure url="https://cdn.example.com/enc.jpg" length="1" type="image/jpeg"/>"#]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/enc.jpg"));
    }

    #[test]
    fn non_image_enclosure_is_ignored() {
        let xml = feed(&[r#"<title>T</title><link>https://example.com/1</link>
            <enclosure url="https://cdn.example.com/episode.mp3" length="1" type="audio/mpeg"/>"#]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items.len(), 1);
        assert!(items[0].image_url.is_none());
    }

    #[test]
    fn gmt_literal_date_is_parsed() {
        assert_eq!(
            parse_pub_date("Mon, 01 Jan 2024 08:15:00 GMT"),
            Published::At(
                DateTime::parse_from_rfc3339("2024-01-01T08:15:00+00:00").unwrap()
            )
        );
    }

    #[test]
    fn numeric_offset_date_is_parsed() {
        let Published::At(dt) = parse_pub_date("Tue, 02 Jan 2024 12:00:00 +0100") else {
            panic!("offset date should parse");
        };
        assert_eq!(dt.day(), 2);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn mismatched_weekday_does_not_lose_the_date() {
        // 2 January 2024 was a Tuesday.
        assert_eq!(
            parse_pub_date("Mon, 02 Jan 2024 09:00:00 GMT"),
            Published::At(
                DateTime::parse_from_rfc3339("2024-01-02T09:00:00+00:00").unwrap()
            )
        );
        assert!(matches!(
            parse_pub_date("Fri, 02 Jan 2024 09:00:00 +0200"),
            Published::At(_)
        ));
    }

    #[test]
    fn date_without_weekday_is_parsed() {
        assert!(matches!(
            parse_pub_date("02 Jan 2024 09:00:00 GMT"),
            Published::At(_)
        ));
    }

    #[test]
    fn unparseable_date_keeps_the_item() {
        let xml = feed(&["<title>Bad date</title><link>https://example.com/1</link>
            <pubDate>sometime last week</pubDate>"]);

        let items = parse_feed(xml.as_bytes(), 10);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published, Published::Unknown);
    }

    #[test]
    fn missing_date_is_unknown() {
        let xml = feed(&["<title>T</title><link>https://example.com/1</link>"]);
        assert_eq!(parse_feed(xml.as_bytes(), 10)[0].published, Published::Unknown);
    }
}
