//! Watchdog runner configuration and health reporting.

use core::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle/health states of a watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogStatus {
    /// Constructed but never started (or disabled).
    Initialized,
    /// Running with no consecutive failures.
    Healthy,
    /// Running with some consecutive failures, below the retry limit.
    Degraded,
    /// Consecutive failures reached the retry limit.
    Unhealthy,
    /// Stopped by request.
    Stopped,
}

impl WatchdogStatus {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WatchdogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loop configuration for one watchdog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Seconds between checks.
    pub check_interval_seconds: u64,
    /// Disabled watchdogs ignore `start()`.
    pub enabled: bool,
    /// Attempts per check before the check counts as failed.
    pub max_retries: u32,
    /// Base delay between retry attempts, in seconds.
    pub retry_delay_seconds: u64,
}

impl WatchdogConfig {
    /// Config with a given interval and the default retry policy.
    #[must_use]
    pub const fn with_interval(seconds: u64) -> Self {
        Self {
            check_interval_seconds: seconds,
            enabled: true,
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }

    /// Check interval as a [`Duration`].
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// Retry delay as a [`Duration`].
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self::with_interval(60)
    }
}

/// Health snapshot of one watchdog, exposed read-only by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogHealth {
    /// Watchdog name.
    pub name: String,
    /// Current lifecycle/health state.
    pub status: WatchdogStatus,
    /// Last completed check, successful or not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    /// Last event emission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event: Option<DateTime<Utc>>,
    /// Checks performed since start.
    pub total_checks: u64,
    /// Events emitted since start.
    pub events_emitted: u64,
    /// Failed checks since start.
    pub errors: u64,
    /// Current run of failed checks; resets on success.
    pub consecutive_failures: u32,
    /// Seconds since the watchdog was started.
    pub uptime_seconds: f64,
}

impl WatchdogHealth {
    /// Fresh, never-started health record.
    #[must_use]
    pub fn initialized(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: WatchdogStatus::Initialized,
            last_check: None,
            last_event: None,
            total_checks: 0,
            events_emitted: 0,
            errors: 0,
            consecutive_failures: 0,
            uptime_seconds: 0.0,
        }
    }
}
