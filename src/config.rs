use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::backend::RetryPolicy;
use crate::calendar::WeekStart;
use crate::limits::MAX_PAGE_SIZE;
use crate::model::Season;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Runtime settings, read from `ROUTECAL_*` environment variables.
///
/// Unset or unparsable values fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub season: Season,
    pub week_starts_on: WeekStart,
    /// Any day of the week to show; today when unset.
    pub week_of: Option<NaiveDate>,
    pub page_size: usize,
    pub fetch: RetryPolicy,
    pub metrics_port: Option<u16>,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let season = lookup("ROUTECAL_SEASON")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let week_starts_on = lookup("ROUTECAL_WEEK_STARTS_ON")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let week_of = lookup("ROUTECAL_WEEK_OF").and_then(|s| s.trim().parse().ok());
        let page_size = lookup("ROUTECAL_PAGE_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let defaults = RetryPolicy::default();
        let attempts = lookup("ROUTECAL_FETCH_ATTEMPTS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.attempts)
            .max(1);
        let backoff = lookup("ROUTECAL_FETCH_BACKOFF_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff);
        let metrics_port = lookup("ROUTECAL_METRICS_PORT").and_then(|s| s.parse().ok());
        let snapshot_path = lookup("ROUTECAL_SNAPSHOT").map(PathBuf::from);

        Self {
            season,
            week_starts_on,
            week_of,
            page_size,
            fetch: RetryPolicy { attempts, backoff },
            metrics_port,
            snapshot_path,
        }
    }
}
