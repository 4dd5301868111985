//! Cache entries and TTL policy knobs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value stored in a cache tier, with its expiry and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached payload.
    pub value: Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; reads at or after this instant miss.
    pub expires_at: DateTime<Utc>,
    /// Provider that produced the value, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_provider: Option<String>,
    /// Provider confidence at write time, `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl CacheEntry {
    /// Build an entry expiring `ttl` from now.
    #[must_use]
    pub fn with_ttl(value: Value, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            source_provider: None,
            confidence: None,
        }
    }

    /// Annotate provenance.
    #[must_use]
    pub fn from_provider(mut self, provider: impl Into<String>, confidence: f64) -> Self {
        self.source_provider = Some(provider.into());
        self.confidence = Some(confidence);
        self
    }

    /// Remaining lifetime from `now`, zero when already expired.
    #[must_use]
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Tunable bands for the volatility- and session-aware TTL policy.
///
/// All values are seconds. The policy itself lives in the orchestrator; the
/// knobs are plain data so deployments can tighten or relax them through
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Equity price/OHLCV during regular market hours.
    pub equity_market_hours_secs: u64,
    /// Equity price/OHLCV during market hours under high intraday volatility.
    pub equity_volatile_secs: u64,
    /// Equity price/OHLCV off-hours and weekends.
    pub equity_off_hours_secs: u64,
    /// Crypto price/OHLCV baseline.
    pub crypto_base_secs: u64,
    /// Crypto floor applied as 24h movement grows past 10%.
    pub crypto_volatile_secs: u64,
    /// Fundamentals.
    pub fundamentals_secs: u64,
    /// News.
    pub news_secs: u64,
    /// Narrative baseline; the narrative policy halves/doubles around it.
    pub narrative_base_secs: u64,
    /// Narrative floor.
    pub narrative_floor_secs: u64,
    /// TTL used when an L2 hit is written behind into L1.
    pub l1_write_behind_secs: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            equity_market_hours_secs: 600,
            equity_volatile_secs: 300,
            equity_off_hours_secs: 2_700,
            crypto_base_secs: 420,
            crypto_volatile_secs: 180,
            fundamentals_secs: 14_400,
            news_secs: 900,
            narrative_base_secs: 600,
            narrative_floor_secs: 180,
            l1_write_behind_secs: 60,
        }
    }
}
