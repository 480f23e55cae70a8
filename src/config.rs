//! Startup configuration from the environment.
//!
//! | Variable              | Required | Default          |
//! |-----------------------|----------|------------------|
//! | `DISCORD_TOKEN`       | yes      |                  |
//! | `DISCORD_CHANNEL_ID`  | yes      |                  |
//! | `FEED_URL`            | yes      |                  |
//! | `SOURCE_LABEL`        | no       | feed host name   |
//! | `BATCH_SIZE`          | no       | 10               |
//! | `LATEST_COUNT`        | no       | 5                |
//! | `POLL_INTERVAL_SECS`  | no       | 3600             |
//! | `HTTP_TIMEOUT_SECS`   | no       | 30               |
//! | `ACTIVE_HOURS_START`  | no       | (always active)  |
//! | `ACTIVE_HOURS_END`    | no       |                  |
//! | `ACTIVE_HOURS_TZ`     | no       |                  |
//! | `LOG_LEVEL`           | no       | info             |
//!
//! The three `ACTIVE_HOURS_*` variables must be set together.  A `.env` file
//! in the working directory is loaded first if present.

use std::env::VarError;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use url::Url;

use crate::app::Settings;
use crate::error::ConfigError;
use crate::poll::{ActiveHours, DEFAULT_POLL_INTERVAL};

const ACTIVE_HOURS_VARS: [&str; 3] = ["ACTIVE_HOURS_START", "ACTIVE_HOURS_END", "ACTIVE_HOURS_TZ"];

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub feed_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub active_hours: Option<ActiveHours>,
    pub log_level: String,
    pub settings: Settings,
}

/// Load configuration, reading `.env` first.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key))
}

/// Parse and validate configuration through `lookup`.
///
/// Decoupled from the process environment so tests can pass a map.
fn build_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    // Unset and blank are treated the same.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let require = |var: &str| -> Result<String, ConfigError> {
        optional(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };
    let parse_or = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_positive(&raw).map_err(|reason| invalid(var, reason)),
        }
    };

    let discord_token = require("DISCORD_TOKEN")?;

    let channel_id = parse_positive(&require("DISCORD_CHANNEL_ID")?)
        .map_err(|reason| invalid("DISCORD_CHANNEL_ID", reason))?;

    let feed_url = require("FEED_URL")?;
    let parsed_url = Url::parse(&feed_url).map_err(|e| invalid("FEED_URL", e.to_string()))?;
    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(invalid(
            "FEED_URL",
            format!("unsupported scheme {:?}", parsed_url.scheme()),
        ));
    }

    let source_label = optional("SOURCE_LABEL")
        .or_else(|| parsed_url.host_str().map(String::from))
        .unwrap_or_else(|| "RSS".to_string());

    let parse_count = |var: &str, default: u64| -> Result<usize, ConfigError> {
        let n = parse_or(var, default)?;
        usize::try_from(n).map_err(|_| invalid(var, format!("{n} is too large for this platform")))
    };

    let batch_size = parse_count("BATCH_SIZE", 10)?;
    let latest_count = parse_count("LATEST_COUNT", 5)?;
    let poll_interval = Duration::from_secs(parse_or("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?);
    let http_timeout = Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 30)?);

    let window_parts: Vec<Option<String>> =
        ACTIVE_HOURS_VARS.iter().map(|&var| optional(var)).collect();
    let active_hours = match window_parts.as_slice() {
        [None, None, None] => None,
        [Some(start), Some(end), Some(tz)] => {
            let start = parse_hour(start).map_err(|r| invalid("ACTIVE_HOURS_START", r))?;
            let end = parse_hour(end).map_err(|r| invalid("ACTIVE_HOURS_END", r))?;
            let tz = Tz::from_str(tz)
                .map_err(|e| invalid("ACTIVE_HOURS_TZ", format!("{tz:?}: {e}")))?;
            Some(ActiveHours::new(start, end, tz).map_err(|r| invalid("ACTIVE_HOURS_START", r))?)
        }
        _ => {
            return Err(invalid(
                "ACTIVE_HOURS_START",
                format!("{} must be set together", ACTIVE_HOURS_VARS.join(", ")),
            ))
        }
    };

    Ok(Config {
        discord_token,
        feed_url,
        poll_interval,
        http_timeout,
        active_hours,
        log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        settings: Settings {
            channel_id,
            source_label,
            batch_size,
            latest_count,
        },
    })
}

fn parse_positive(raw: &str) -> Result<u64, String> {
    match raw.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("{raw:?}: {e}")),
    }
}

fn parse_hour(raw: &str) -> Result<u32, String> {
    raw.parse::<u32>().map_err(|e| format!("{raw:?}: {e}"))
}
