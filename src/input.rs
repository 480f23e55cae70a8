//! Console command handling.
//!
//! While the bot runs, lines typed on stdin act as commands.  Mapping text
//! to an action is [`parse_command`]; carrying it out is
//! [`handle_command`].
//!
//! ## For contributors
//!
//! To add a command:
//!
//! 1. Add a variant to [`Command`].
//! 2. Add a match arm in [`parse_command`] and in [`handle_command`].
//! 3. Update [`HELP`].

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::app::App;

pub const HELP: &str = "commands: latest (post the newest items), check (run a cycle now), quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Post the newest feed items to the configured channel.
    Latest,
    /// Run a notification cycle right away, ignoring active hours.
    Check,
    Help,
    Quit,
}

/// Parse one input line.  A leading `!` is accepted, matching how the
/// commands are typed in chat.  Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let word = line.trim().trim_start_matches('!').trim();
    if word.is_empty() {
        return None;
    }

    Some(match word.to_ascii_lowercase().as_str() {
        "latest" => Ok(Command::Latest),
        "check" => Ok(Command::Check),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(word.to_string()),
    })
}

/// Carry out `command`.  Returns `false` when the caller should stop.
pub async fn handle_command(app: &App, command: Command) -> bool {
    match command {
        Command::Latest => {
            let channel = app.settings().channel_id;
            match app.show_latest(channel).await {
                Ok(shown) => info!("Posted {shown} latest items"),
                Err(e) => error!("Could not post latest items: {e}"),
            }
        }
        Command::Check => {
            let report = app.run_cycle().await;
            info!("Manual check finished: {report:?}");
        }
        Command::Help => info!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

/// Read commands from stdin until `quit`.
///
/// If stdin closes (e.g. running under a service manager) this never
/// returns, leaving shutdown to the signal handler.
pub async fn run_console(app: &App) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(Ok(command)) => {
                    if !handle_command(app, command).await {
                        return;
                    }
                }
                Some(Err(unknown)) => warn!("Unknown command {unknown:?}; {HELP}"),
                None => {}
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Console input unavailable: {e}");
                break;
            }
        }
    }

    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{feed_xml, settings, FakeSource};
    use crate::notify::testing::RecordingNotifier;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command("latest"), Some(Ok(Command::Latest)));
        assert_eq!(parse_command("  CHECK \n"), Some(Ok(Command::Check)));
        assert_eq!(parse_command("!latest"), Some(Ok(Command::Latest)));
        assert_eq!(parse_command("exit"), Some(Ok(Command::Quit)));
        assert_eq!(parse_command("?"), Some(Ok(Command::Help)));
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("!"), None);
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(parse_command("frobnicate"), Some(Err("frobnicate".into())));
    }

    #[tokio::test]
    async fn quit_stops_and_others_continue() {
        let source = FakeSource::serving(feed_xml(&["1"]));
        let app = App::new(
            Box::new(source.clone()),
            Box::new(RecordingNotifier::default()),
            settings(),
        );

        assert!(handle_command(&app, Command::Help).await);
        assert!(handle_command(&app, Command::Check).await);
        assert_eq!(app.seen_count().await, 1, "check ran a cycle");
        assert!(!handle_command(&app, Command::Quit).await);
    }
}
