//! feed-notify announces new items from a news RSS feed in a chat channel.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  fire()   ┌──────────────────────────────┐  Message  ┌───────────┐
//! │ poll.rs  │ ────────► │ app.rs                       │ ────────► │ notify/   │
//! │ (timer)  │           │ fetch → parse → diff → render│           │ (Discord) │
//! └──────────┘           └──────────────────────────────┘           └───────────┘
//!                              ▲
//!                              │ handle_command()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`source/`**: the `FeedSource` trait, the HTTP fetcher and the RSS
//!   parser producing `NewsItem`s.
//! * **`seen`**: memory of already-announced links.
//! * **`poll`**: hourly timer gated by optional active hours.
//! * **`app`**: owns all state and runs the periodic and on-demand flows.
//! * **`render`**: turns items into embed messages.
//! * **`notify/`**: the `Notifier` trait and Discord delivery.
//! * **`input`**: console commands while running.
//! * **`main`**: wires everything together: load config, set up logging,
//!   and dispatch the subcommand.

mod app;
mod config;
mod error;
mod input;
mod logging;
mod notify;
mod poll;
mod render;
mod seen;
mod source;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use app::App;
use config::Config;
use notify::DiscordNotifier;
use poll::Scheduler;
use source::HttpFetcher;

#[derive(Debug, Parser)]
#[command(name = "feed-notify")]
#[command(about = "Announce new RSS feed items in a Discord channel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Commands {
    /// Poll the feed on a schedule and accept console commands (default).
    Run,
    /// Post the newest feed items to the channel once and exit.
    Latest,
}

fn build_app(config: &Config) -> Result<App> {
    let fetcher = HttpFetcher::new(
        &config.feed_url,
        config.settings.source_label.clone(),
        config.http_timeout,
    )
    .context("failed to set up feed fetcher")?;
    let notifier = DiscordNotifier::new(config.discord_token.clone(), config.http_timeout)
        .context("failed to set up Discord client")?;

    Ok(App::new(
        Box::new(fetcher),
        Box::new(notifier),
        config.settings.clone(),
    ))
}

async fn run(app: Arc<App>, config: &Config) -> Result<()> {
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&app),
        config.poll_interval,
        config.active_hours,
    ));
    scheduler.start();
    info!("{}", input::HELP);

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for shutdown signal")?;
            info!("Interrupted, shutting down");
        }
        () = input::run_console(&app) => {
            info!("Shutting down");
        }
    }
    info!("{} links remembered this session", app.seen_count().await);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load().context("invalid configuration")?;
    logging::init(&config.log_level);

    let app = Arc::new(build_app(&config)?);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(app, &config).await?,
        Commands::Latest => {
            let shown = app
                .show_latest(config.settings.channel_id)
                .await
                .context("failed to post latest items")?;
            info!("Posted {shown} items");
        }
    }

    Ok(())
}
