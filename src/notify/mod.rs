//! Message delivery.
//!
//! The pipeline talks to the chat service only through the [`Notifier`]
//! trait, handing it a [`Message`] and a channel id.  [`DiscordNotifier`] is
//! the production implementation; tests use an in-memory recorder.

mod discord;

pub use discord::DiscordNotifier;

use async_trait::async_trait;

use crate::error::NotifyError;

/// Numeric chat channel identifier.
pub type ChannelId = u64;

/// A rich card: linked headline, body, optional picture and footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub image_url: Option<String>,
    pub footer: String,
    /// 24-bit RGB accent color.
    pub color: u32,
}

/// Something the bot can post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Short plain-text status line.
    Text(String),
    Embed(Embed),
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text(text.into())
    }
}

/// Delivery collaborator.
///
/// Failures are reported to the caller, which decides whether to abort the
/// cycle (channel problems) or skip the item (delivery problems).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Check that `channel` exists and is reachable before posting to it.
    async fn resolve_channel(&self, channel: ChannelId) -> Result<(), NotifyError>;

    /// Post `message` to `channel`.
    async fn deliver(&self, channel: ChannelId, message: &Message) -> Result<(), NotifyError>;
}
