//! Extreme perpetual funding-rate detection.

use std::sync::Arc;

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::{Asset, EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};
use crate::detectors::sources::FundingRateSource;

/// Alerts when the cross-exchange average 8h funding rate turns extreme.
pub struct FundingRateDetector {
    source: Arc<dyn FundingRateSource>,
    assets: Vec<Asset>,
    threshold: f64,
    debounce: Debouncer,
}

impl FundingRateDetector {
    /// Detector over `assets` with the default 0.1%-per-8h threshold.
    #[must_use]
    pub fn new(source: Arc<dyn FundingRateSource>, assets: Vec<Asset>) -> Self {
        Self {
            source,
            assets,
            threshold: 0.001,
            debounce: Debouncer::new(std::time::Duration::from_secs(1_800)),
        }
    }

    /// Override the absolute rate threshold (fraction per 8h).
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl Detector for FundingRateDetector {
    fn name(&self) -> &'static str {
        "funding_rate"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for asset in &self.assets {
            let rates = self.source.funding_rates(asset).await?;
            if rates.is_empty() {
                continue;
            }

            let avg: f64 = rates.values().sum::<f64>() / rates.len() as f64;
            if avg.abs() <= self.threshold {
                continue;
            }
            if !self.debounce.should_emit(&asset.symbol, EventType::FundingSpike) {
                continue;
            }

            let severity = if avg.abs() > 0.003 {
                Severity::Critical
            } else {
                Severity::High
            };
            let by_exchange: serde_json::Map<String, serde_json::Value> = rates
                .into_iter()
                .map(|(exchange, rate)| (exchange, json!(rate)))
                .collect();
            let event = WatchdogEvent::new(
                EventType::FundingSpike,
                severity,
                Some(asset.clone()),
                format!(
                    "{} extreme funding rate: {:.3}% per 8h",
                    asset.symbol,
                    avg * 100.0
                ),
            )
            .with_data("avg_funding_rate", json!(avg))
            .with_data("funding_rate_pct", json!(avg * 100.0))
            .with_data("by_exchange", serde_json::Value::Object(by_exchange));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
