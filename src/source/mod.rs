//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait and the normalised
//! [`NewsItem`] type.  Fetching and parsing are deliberately separate steps:
//!
//! * [`fetch`] retrieves raw bytes over HTTP ([`HttpFetcher`]).
//! * [`parse`] turns those bytes into [`NewsItem`]s ([`parse_feed`]).
//!
//! ## Swapping the transport
//!
//! The pipeline only sees `dyn FeedSource`, so tests (and any future
//! non-HTTP source) implement the trait and hand raw bytes back.  The parser
//! is a pure function and never needs to change for that.

mod fetch;
mod news_item;
mod parse;

// Re-export the public API of this module so callers can write
// `use crate::source::{FeedSource, HttpFetcher, NewsItem};`
pub use fetch::HttpFetcher;
pub use news_item::{NewsItem, Published};
pub use parse::parse_feed;

#[cfg(test)]
pub(crate) use news_item::tests::make_item;

use async_trait::async_trait;

use crate::error::FetchError;

/// Something that can hand back the raw feed document.
///
/// Implementations must not retry internally; a failed fetch is retried by
/// the next scheduled cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable label used in logs.
    fn name(&self) -> &str;

    /// Retrieve the current feed document.
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}
