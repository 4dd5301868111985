//! Rapid price movement and flash-crash detection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use faro_core::{FaroError, MarketReader};
use faro_types::{Asset, DataKind, EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};

/// Watches a symbol list for fast moves: beyond the threshold within the
/// move window is an anomaly, a drop past −10% is a flash crash.
pub struct PriceAnomalyDetector {
    reader: Arc<dyn MarketReader>,
    assets: Vec<Asset>,
    threshold_pct: f64,
    move_window: Duration,
    history_keep: Duration,
    history: Mutex<HashMap<String, Vec<(Instant, f64)>>>,
    debounce: Debouncer,
}

impl PriceAnomalyDetector {
    /// Detector over `assets` with the default 5% / 1 min windows.
    #[must_use]
    pub fn new(reader: Arc<dyn MarketReader>, assets: Vec<Asset>) -> Self {
        Self {
            reader,
            assets,
            threshold_pct: 5.0,
            move_window: Duration::from_secs(60),
            history_keep: Duration::from_secs(120),
            history: Mutex::new(HashMap::new()),
            debounce: Debouncer::new(Duration::from_secs(120)),
        }
    }

    /// Override the trigger threshold (percent).
    #[must_use]
    pub fn with_threshold(mut self, threshold_pct: f64) -> Self {
        self.threshold_pct = threshold_pct;
        self
    }

    /// Override the comparison and retention windows; short windows keep
    /// tests fast.
    #[must_use]
    pub fn with_windows(mut self, move_window: Duration, history_keep: Duration) -> Self {
        self.move_window = move_window;
        self.history_keep = history_keep;
        self
    }

    /// Record a price and return the newest price at least one move-window
    /// old, pruning anything past the retention window.
    fn record_and_reference(&self, symbol: &str, price: f64) -> Option<f64> {
        let now = Instant::now();
        let mut history = self.history.lock().expect("price history mutex poisoned");
        let series = history.entry(symbol.to_string()).or_default();
        series.push((now, price));
        series.retain(|(t, _)| now.duration_since(*t) <= self.history_keep);
        series
            .iter()
            .filter(|(t, _)| now.duration_since(*t) >= self.move_window)
            .next_back()
            .map(|(_, p)| *p)
    }
}

#[async_trait]
impl Detector for PriceAnomalyDetector {
    fn name(&self) -> &'static str {
        "price_anomaly"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for asset in &self.assets {
            let response = self.reader.latest(asset, DataKind::Price).await?;
            if !response.is_valid {
                continue;
            }
            let Some(current) = response.price() else {
                continue;
            };
            let Some(past) = self.record_and_reference(&asset.symbol, current) else {
                continue;
            };
            if past == 0.0 {
                continue;
            }

            let change_pct = (current - past) / past * 100.0;
            if change_pct.abs() <= self.threshold_pct {
                continue;
            }

            let event_type = if change_pct < -10.0 {
                EventType::FlashCrash
            } else {
                EventType::PriceAnomaly
            };
            if !self.debounce.should_emit(&asset.symbol, event_type) {
                continue;
            }
            let severity = if change_pct.abs() > 10.0 {
                Severity::Critical
            } else {
                Severity::High
            };

            let sign = if change_pct > 0.0 { "+" } else { "" };
            let event = WatchdogEvent::new(
                event_type,
                severity,
                Some(asset.clone()),
                format!(
                    "{} rapid price movement: {sign}{change_pct:.2}% in {}s",
                    asset.symbol,
                    self.move_window.as_secs()
                ),
            )
            .with_data("current_price", json!(current))
            .with_data("past_price", json!(past))
            .with_data("change_pct", json!(change_pct))
            .with_data("time_window_seconds", json!(self.move_window.as_secs()));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
