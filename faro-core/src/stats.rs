//! Per-provider call bookkeeping behind health reports and freshness scores.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use faro_types::ProviderHealth;

/// Latency EWMA smoothing factor; recent calls dominate.
const LATENCY_ALPHA: f64 = 0.3;

/// A provider is reported unhealthy below this success rate.
const HEALTHY_SUCCESS_RATE: f64 = 0.5;

#[derive(Debug, Default)]
struct StatsInner {
    request_count: u64,
    error_count: u64,
    last_request: Option<DateTime<Utc>>,
    avg_latency_ms: f64,
    error_times: Vec<DateTime<Utc>>,
}

/// Concurrent call statistics a concrete provider embeds.
///
/// Every successful or failed upstream call is recorded here; the arbitration
/// engine reads the derived [`ProviderHealth`] when scoring and uses
/// `last_request` as the freshness signal.
#[derive(Debug, Default)]
pub struct ProviderStats {
    inner: Mutex<StatsInner>,
}

impl ProviderStats {
    /// Fresh, empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call and its observed latency.
    pub fn record_success(&self, latency: Duration) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        inner.request_count += 1;
        inner.last_request = Some(Utc::now());
        let sample = latency.as_secs_f64() * 1_000.0;
        inner.avg_latency_ms = if inner.request_count == 1 {
            sample
        } else {
            LATENCY_ALPHA * sample + (1.0 - LATENCY_ALPHA) * inner.avg_latency_ms
        };
    }

    /// Record a failed call.
    pub fn record_error(&self) {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        inner.request_count += 1;
        inner.error_count += 1;
        inner.last_request = Some(now);
        let cutoff = now - chrono::Duration::hours(24);
        inner.error_times.retain(|t| *t > cutoff);
        inner.error_times.push(now);
    }

    /// Timestamp of the most recent call, successful or not.
    #[must_use]
    pub fn last_request(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().expect("stats mutex poisoned").last_request
    }

    /// Total calls recorded.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.inner
            .lock()
            .expect("stats mutex poisoned")
            .request_count
    }

    /// Derived health snapshot for the given provider name.
    #[must_use]
    pub fn health(&self, name: &str) -> ProviderHealth {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        let cutoff = now - chrono::Duration::hours(24);
        inner.error_times.retain(|t| *t > cutoff);

        let success_rate = if inner.request_count == 0 {
            1.0
        } else {
            1.0 - (inner.error_count as f64 / inner.request_count as f64)
        };
        ProviderHealth {
            name: name.to_string(),
            is_healthy: success_rate >= HEALTHY_SUCCESS_RATE,
            uptime_percent: success_rate * 100.0,
            avg_latency_ms: inner.avg_latency_ms,
            success_rate,
            last_check: now,
            error_count_24h: inner.error_times.len() as u64,
        }
    }
}
