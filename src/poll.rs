//! Periodic feed polling.
//!
//! A [`Scheduler`] runs a background task that wakes on a fixed interval
//! and calls [`App::run_cycle`], unless an [`ActiveHours`] window is
//! configured and the current local hour falls outside it.  Skipped cycles
//! do nothing at all: no fetch, no diff.
//!
//! ## For contributors
//!
//! The timer loop is intentionally thin.  All gating happens in
//! [`Scheduler::fire`], which takes the current instant as an argument so
//! tests can evaluate the window at any hour without waiting on a clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::app::{App, CycleReport};

/// Default cadence: hourly.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Daily window `[start, end)` of local hours during which polling runs.
///
/// When `start > end` the window wraps past midnight: `9..3` means
/// 09:00 through 02:59 the next morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    start: u32,
    end: u32,
    tz: Tz,
}

impl ActiveHours {
    /// Build a window; hours must be `0..=23` and distinct.
    pub fn new(start: u32, end: u32, tz: Tz) -> Result<Self, String> {
        if start > 23 || end > 23 {
            return Err(format!("hours must be between 0 and 23 (got {start}..{end})"));
        }
        if start == end {
            return Err(format!("start and end hour are both {start}"));
        }
        Ok(Self { start, end, tz })
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start < self.end {
            (self.start..self.end).contains(&hour)
        } else {
            hour >= self.start || hour < self.end
        }
    }

    /// Whether `now` falls inside the window in the configured zone.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.contains_hour(now.with_timezone(&self.tz).hour())
    }
}

/// Recurring trigger for the notification cycle.
pub struct Scheduler {
    app: Arc<App>,
    every: Duration,
    window: Option<ActiveHours>,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(app: Arc<App>, every: Duration, window: Option<ActiveHours>) -> Self {
        Self {
            app,
            every,
            window,
            running: AtomicBool::new(false),
        }
    }

    /// Spawn the polling task.  The first cycle runs immediately.
    ///
    /// Calling this on a scheduler that is already running does nothing and
    /// returns `None`.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Scheduler already running, ignoring start");
            return None;
        }

        info!(
            "Scheduler started (interval: {} seconds, active hours: {})",
            self.every.as_secs(),
            self.window
                .map(|w| format!("{}..{} {}", w.start, w.end, w.tz))
                .unwrap_or_else(|| "always".into())
        );

        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut timer = interval(this.every);
            // A long stall should not cause a burst of catch-up cycles.
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                let report = this.fire(Utc::now()).await;
                debug!("Cycle finished: {report:?}");
            }
        }))
    }

    /// Evaluate the window at `now` and run a cycle if it is open.
    pub async fn fire(&self, now: DateTime<Utc>) -> CycleReport {
        if let Some(window) = &self.window {
            if !window.is_active_at(now) {
                debug!("Outside active hours, skipping cycle");
                return CycleReport::Skipped;
            }
        }
        self.app.run_cycle().await
    }
}
