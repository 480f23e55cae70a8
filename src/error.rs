//! Error types for fetching, delivery and configuration.
//!
//! None of these are fatal once the process is running: the pipeline logs
//! them and waits for the next cycle.

use thiserror::Error;

/// Failure to retrieve the raw feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured feed URL could not be turned into a request URL.
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),

    /// Connection, TLS, timeout or body-read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("feed server returned HTTP {0}")]
    Status(u16),
}

/// Failure to hand a message to the chat service.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The target channel does not exist or is not visible to the bot.
    #[error("channel {0} not found or not accessible")]
    ChannelNotFound(u64),

    /// The chat service refused the message.
    #[error("chat API rejected request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("chat API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Invalid or missing startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
