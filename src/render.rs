//! Message rendering.
//!
//! All formatting lives here, separated from the pipeline ([`crate::app`])
//! and the transport ([`crate::notify`]).
//!
//! ## For contributors
//!
//! * Periodic announcements and on-demand listings share one layout and
//!   differ only in [`Style`]: accent color and whether the footer names the
//!   source.
//! * Status lines for the on-demand command are plain text helpers at the
//!   bottom of this file.

use crate::notify::{Embed, Message};
use crate::source::NewsItem;

/// Accent for automatic new-item announcements (dark blue).
pub const ANNOUNCE_COLOR: u32 = 0x20_66_94;

/// Accent for on-demand listings (green).
pub const LATEST_COLOR: u32 = 0x2E_CC_71;

/// Which kind of message an item is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style<'a> {
    /// Periodic announcement; footer carries the source label.
    Announcement { source_label: &'a str },
    /// Reply to the "show latest" command.
    Latest,
}

/// Render one item as an embed message.
pub fn item_message(item: &NewsItem, style: Style<'_>) -> Message {
    let (color, footer) = match style {
        Style::Announcement { source_label } => (
            ANNOUNCE_COLOR,
            format!("Published {} • {source_label}", item.published),
        ),
        Style::Latest => (LATEST_COLOR, format!("Published {}", item.published)),
    };

    Message::Embed(Embed {
        title: item.title.clone(),
        url: item.link.clone(),
        description: item.description.clone(),
        image_url: item.image_url.clone(),
        footer,
        color,
    })
}

// -- on-demand status lines -------------------------------------------------

pub fn latest_intro(count: usize) -> Message {
    Message::text(format!(
        "Checking the feed for the latest {count} items..."
    ))
}

pub fn latest_none() -> Message {
    Message::text("No items could be retrieved from the feed. Check the logs for errors.")
}

pub fn latest_found(found: usize, shown: usize) -> Message {
    Message::text(format!(
        "Found {found} items. Showing the {shown} most recent:"
    ))
}
