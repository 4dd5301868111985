//! Provider metadata, capability labels and static configuration.

use core::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed key identifying a provider in configuration and plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey(pub &'static str);

impl ProviderKey {
    /// Construct a typed provider key from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<ProviderKey> for &'static str {
    fn from(k: ProviderKey) -> Self {
        k.0
    }
}

/// The closed set of data categories the gateway serves.
///
/// These labels appear in cache keys, plan logs and errors, so the kebab-case
/// ids are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DataKind {
    /// Point-in-time price with intraday change.
    Price,
    /// Historical OHLCV candles.
    Ohlcv,
    /// Valuation and balance-sheet style fundamentals.
    Fundamentals,
    /// Technical indicator inputs (served by OHLCV-capable providers).
    Technical,
    /// Recent news articles.
    News,
}

impl DataKind {
    /// Stable, kebab-case identifier for logs, errors and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Ohlcv => "ohlcv",
            Self::Fundamentals => "fundamentals",
            Self::Technical => "technical",
            Self::News => "news",
        }
    }

    /// All kinds, in a stable order. Used by pattern invalidation sweeps.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Price,
            Self::Ohlcv,
            Self::Fundamentals,
            Self::Technical,
            Self::News,
        ]
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static, environment-driven configuration for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Stable provider name (must match a factory-table entry).
    pub name: String,
    /// Disabled providers are constructed but never routed to.
    pub enabled: bool,
    /// Static priority; higher wins ties between equal arbitration scores.
    pub priority: u8,
    /// Self-enforced request budget over a rolling minute.
    pub rate_limit_per_minute: u32,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Upstream credential; `None` disables providers that require one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Conservative defaults for a named provider.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority: 5,
            rate_limit_per_minute: 60,
            timeout_seconds: 5,
            api_key: None,
        }
    }

    /// The per-call timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Self-reported operational health of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Provider name.
    pub name: String,
    /// Overall healthy flag derived from the success rate.
    pub is_healthy: bool,
    /// Uptime percentage over the tracked window, `[0, 100]`.
    pub uptime_percent: f64,
    /// Exponentially weighted average call latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Success rate over the tracked window, `[0, 1]`.
    pub success_rate: f64,
    /// When this snapshot was taken.
    pub last_check: DateTime<Utc>,
    /// Errors observed in the last 24 hours.
    pub error_count_24h: u64,
}

impl ProviderHealth {
    /// A pessimistic snapshot used when a provider cannot report for itself.
    #[must_use]
    pub fn unreachable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_healthy: false,
            uptime_percent: 0.0,
            avg_latency_ms: 0.0,
            success_rate: 0.0,
            last_check: Utc::now(),
            error_count_24h: 1,
        }
    }
}
