//! Discord REST delivery.
//!
//! Posts messages with a bot token through the HTTP API; no gateway session
//! is opened.  Embed fields are truncated to Discord's documented limits so
//! a long article never turns into a rejected message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::{ChannelId, Embed, Message, Notifier};
use crate::error::NotifyError;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;
const MAX_FOOTER_CHARS: usize = 2048;
const MAX_CONTENT_CHARS: usize = 2000;
/// Combined limit across every text field of one embed.
const MAX_EMBED_CHARS: usize = 6000;

pub struct DiscordNotifier {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordNotifier {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        Self::with_api_base(token, timeout, DEFAULT_API_BASE)
    }

    /// Like [`new`](Self::new) but against a different API root (tests).
    pub fn with_api_base(
        token: impl Into<String>,
        timeout: Duration,
        api_base: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn channel_url(&self, channel: ChannelId) -> String {
        format!("{}/channels/{channel}", self.api_base)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn resolve_channel(&self, channel: ChannelId) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(self.channel_url(channel))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                Err(NotifyError::ChannelNotFound(channel))
            }
            s => Err(NotifyError::Rejected {
                status: s.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn deliver(&self, channel: ChannelId, message: &Message) -> Result<(), NotifyError> {
        let payload = CreateMessage::from(message);
        let response = self
            .client
            .post(format!("{}/messages", self.channel_url(channel)))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        debug!("Delivered message to channel {channel}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<WireEmbed>,
}

#[derive(Debug, Serialize)]
struct WireEmbed {
    title: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<WireImage>,
    footer: WireFooter,
}

#[derive(Debug, Serialize)]
struct WireImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct WireFooter {
    text: String,
}

impl From<&Message> for CreateMessage {
    fn from(message: &Message) -> Self {
        match message {
            Message::Text(text) => CreateMessage {
                content: Some(truncate(text, MAX_CONTENT_CHARS)),
                embeds: Vec::new(),
            },
            Message::Embed(embed) => CreateMessage {
                content: None,
                embeds: vec![WireEmbed::from(embed)],
            },
        }
    }
}

impl From<&Embed> for WireEmbed {
    fn from(embed: &Embed) -> Self {
        let title = truncate(&embed.title, MAX_TITLE_CHARS);
        let footer = truncate(&embed.footer, MAX_FOOTER_CHARS);
        // The description gets whatever the title and footer leave over.
        let remaining = MAX_EMBED_CHARS - title.chars().count() - footer.chars().count();
        let description = truncate(&embed.description, remaining.min(MAX_DESCRIPTION_CHARS));

        WireEmbed {
            title,
            url: embed.url.clone(),
            description: Some(description).filter(|d| !d.is_empty()),
            color: embed.color,
            image: embed.image_url.clone().map(|url| WireImage { url }),
            footer: WireFooter { text: footer },
        }
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
