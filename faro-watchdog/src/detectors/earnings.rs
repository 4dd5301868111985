//! Earnings surprise detection against analyst estimates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use faro_core::{FaroError, MarketReader};
use faro_types::{Asset, DataKind, EventType, Severity, WatchdogEvent};
use serde_json::{Value, json};

use crate::base::Detector;

/// Flags reported EPS diverging from the estimate beyond a threshold.
///
/// Each `(symbol, report_date)` is processed once; a report with no date is
/// keyed `"latest"` and so fires once per restart.
pub struct EarningsAnomalyDetector {
    reader: Arc<dyn MarketReader>,
    assets: Vec<Asset>,
    surprise_threshold_pct: f64,
    processed: Mutex<HashMap<String, String>>,
}

impl EarningsAnomalyDetector {
    /// Detector over `assets` with the default 10% surprise threshold.
    #[must_use]
    pub fn new(reader: Arc<dyn MarketReader>, assets: Vec<Asset>) -> Self {
        Self {
            reader,
            assets,
            surprise_threshold_pct: 10.0,
            processed: Mutex::new(HashMap::new()),
        }
    }

    /// Override the surprise threshold (percent).
    #[must_use]
    pub fn with_threshold(mut self, threshold_pct: f64) -> Self {
        self.surprise_threshold_pct = threshold_pct;
        self
    }

    fn already_processed(&self, symbol: &str, report_date: &str) -> bool {
        let mut processed = self.processed.lock().expect("earnings mutex poisoned");
        match processed.get(symbol) {
            Some(seen) if seen == report_date => true,
            _ => {
                processed.insert(symbol.to_string(), report_date.to_string());
                false
            }
        }
    }
}

#[async_trait]
impl Detector for EarningsAnomalyDetector {
    fn name(&self) -> &'static str {
        "earnings_anomaly"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for asset in &self.assets {
            let response = self.reader.latest(asset, DataKind::Fundamentals).await?;
            if !response.is_valid {
                continue;
            }

            let Some(actual) = response.number("actual_eps") else {
                continue;
            };
            let Some(estimate) = response.number("estimated_eps") else {
                continue;
            };
            if estimate == 0.0 {
                continue;
            }

            let surprise_pct = (actual - estimate) / estimate.abs() * 100.0;
            if surprise_pct.abs() <= self.surprise_threshold_pct {
                continue;
            }

            let report_date = response
                .data
                .get("report_date")
                .and_then(Value::as_str)
                .unwrap_or("latest")
                .to_string();
            if self.already_processed(&asset.symbol, &report_date) {
                continue;
            }

            let severity = if surprise_pct.abs() > 20.0 {
                Severity::High
            } else {
                Severity::Medium
            };
            let verb = if surprise_pct > 0.0 { "beat" } else { "missed" };
            let event = WatchdogEvent::new(
                EventType::EarningsAnomaly,
                severity,
                Some(asset.clone()),
                format!(
                    "{} {verb} earnings by {:.1}%",
                    asset.symbol,
                    surprise_pct.abs()
                ),
            )
            .with_data("actual_eps", json!(actual))
            .with_data("estimated_eps", json!(estimate))
            .with_data("surprise_pct", json!(surprise_pct))
            .with_data("report_date", json!(report_date));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
