//! The normalised record produced by the feed parser.
//!
//! `NewsItem` is what the rest of the application works with: the pipeline
//! diffs on [`NewsItem::link`], the renderer turns the other fields into an
//! embed.  Nothing downstream looks at raw RSS types.
//!
//! ## For contributors
//!
//! If the feed grows a field you want to show (author, category, ...), add it
//! here and populate it in [`super::parse::item_from_entry`].

use std::fmt;

use chrono::{DateTime, FixedOffset};

/// Text shown in place of a publish date that could not be parsed.
pub const DATE_UNAVAILABLE: &str = "date unavailable";

/// Publication time of an item, or a marker that the feed's date was not
/// in a recognised format.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Published {
    At(DateTime<FixedOffset>),
    Unknown,
}

impl fmt::Display for Published {
    /// Human-readable calendar date, e.g. `07 March 2025`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Published::At(dt) => write!(f, "{}", dt.format("%d %B %Y")),
            Published::Unknown => f.write_str(DATE_UNAVAILABLE),
        }
    }
}

/// A single feed entry, normalised from the source markup.
///
/// Values are never mutated after the parser builds them; the pipeline only
/// reads them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewsItem {
    /// Headline.  Never empty.
    pub title: String,

    /// Absolute URL of the article.
    ///
    /// Also the identity key: two fetches returning the same link are the
    /// same logical item, regardless of any other field.
    pub link: String,

    /// Plain-text body with markup stripped.  Empty when the feed had none.
    pub description: String,

    /// Best-effort picture for the article.
    pub image_url: Option<String>,

    pub published: Published,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
