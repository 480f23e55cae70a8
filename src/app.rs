//! Application context and the two feed workflows.
//!
//! [`App`] owns everything a cycle needs: the feed source, the notifier and
//! the [`SeenStore`].  There is no global state; the scheduler and the
//! console both hold an `Arc<App>`.
//!
//! * [`App::run_cycle`] is the periodic path: fetch, parse, diff, announce.
//! * [`App::show_latest`] is the on-demand path: fetch, parse, list; no diffing.

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::NotifyError;
use crate::notify::{ChannelId, Notifier};
use crate::render::{self, Style};
use crate::seen::SeenStore;
use crate::source::{parse_feed, FeedSource, NewsItem};

/// Pipeline knobs taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where periodic announcements go.
    pub channel_id: ChannelId,
    /// Shown in announcement footers.
    pub source_label: String,
    /// How many feed entries a fetch considers.
    pub batch_size: usize,
    /// How many entries the on-demand listing shows.
    pub latest_count: usize,
}

/// Outcome of one periodic cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    /// Outside the active-hours window; nothing was fetched.
    Skipped,
    FetchFailed,
    /// The feed parsed to zero usable items.
    Empty,
    /// First successful poll: this many links remembered, nothing posted.
    Bootstrapped(usize),
    /// New items existed but the target channel could not be resolved.
    ChannelUnavailable,
    /// `pending` new items were left unannounced after a delivery failure.
    Delivered { sent: usize, pending: usize },
}

pub struct App {
    source: Box<dyn FeedSource>,
    notifier: Box<dyn Notifier>,
    /// Held for the whole of a periodic cycle so cycles never interleave.
    seen: Mutex<SeenStore>,
    settings: Settings,
}

impl App {
    pub fn new(
        source: Box<dyn FeedSource>,
        notifier: Box<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        Self {
            source,
            notifier,
            seen: Mutex::new(SeenStore::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of links currently remembered.
    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }

    /// Fetch and parse the current batch, logging and swallowing fetch errors.
    async fn current_items(&self) -> Option<Vec<NewsItem>> {
        match self.source.fetch().await {
            Ok(raw) => Some(parse_feed(&raw, self.settings.batch_size)),
            Err(e) => {
                warn!("Failed to fetch {}: {e}", self.source.name());
                None
            }
        }
    }

    // -- periodic path -------------------------------------------------------

    /// Run one notification cycle.
    ///
    /// The first cycle that sees items only remembers them.  Later cycles
    /// announce unknown items oldest first, marking each as known only once
    /// its delivery succeeded.  The first failed delivery ends the cycle so
    /// the remaining items are announced, still oldest first, next cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut seen = self.seen.lock().await;
        info!("Checking {} for new items", self.source.name());

        let Some(items) = self.current_items().await else {
            return CycleReport::FetchFailed;
        };
        if items.is_empty() {
            info!("No items found this cycle");
            return CycleReport::Empty;
        }

        if seen.is_empty() {
            let remembered = seen.bootstrap(items.iter().map(|item| item.link.clone()));
            info!("First check complete, remembered {remembered} existing items");
            return CycleReport::Bootstrapped(remembered);
        }

        // Feed order is newest first; announce in chronological order.  A
        // link listed twice is announced once.
        let mut batch_links = HashSet::new();
        let fresh: Vec<&NewsItem> = items
            .iter()
            .rev()
            .filter(|item| !seen.is_known(&item.link))
            .filter(|&item| batch_links.insert(item.link.as_str()))
            .collect();
        if fresh.is_empty() {
            info!("No new items");
            return CycleReport::Delivered { sent: 0, pending: 0 };
        }

        let channel = self.settings.channel_id;
        if let Err(e) = self.notifier.resolve_channel(channel).await {
            error!("Cannot announce {} new items: {e}", fresh.len());
            return CycleReport::ChannelUnavailable;
        }

        let style = Style::Announcement {
            source_label: &self.settings.source_label,
        };
        let total = fresh.len();
        let mut sent = 0;
        for item in fresh {
            info!("New item found: {}", item.title);
            if let Err(e) = self
                .notifier
                .deliver(channel, &render::item_message(item, style))
                .await
            {
                warn!(
                    "Failed to announce {}: {e}; {} items deferred to next cycle",
                    item.link,
                    total - sent
                );
                break;
            }
            seen.mark_known(item.link.clone());
            sent += 1;
        }

        CycleReport::Delivered {
            sent,
            pending: total - sent,
        }
    }

    // -- on-demand path ------------------------------------------------------

    /// Post the newest items to `channel`, bracketed by status lines.
    ///
    /// Independent of announcement history and never modifies it.  Returns
    /// how many items were shown; only delivery errors are returned, a feed
    /// failure becomes the "no items" status line.
    pub async fn show_latest(&self, channel: ChannelId) -> Result<usize, NotifyError> {
        let count = self.settings.latest_count;
        self.notifier
            .deliver(channel, &render::latest_intro(count))
            .await?;

        let items = self.current_items().await.unwrap_or_default();
        if items.is_empty() {
            self.notifier.deliver(channel, &render::latest_none()).await?;
            return Ok(0);
        }

        let shown = items.len().min(count);
        self.notifier
            .deliver(channel, &render::latest_found(items.len(), shown))
            .await?;
        for item in items.iter().take(shown) {
            self.notifier
                .deliver(channel, &render::item_message(item, Style::Latest))
                .await?;
        }

        Ok(shown)
    }
}
