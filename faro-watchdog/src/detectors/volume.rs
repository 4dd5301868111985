//! Unusual traded-volume detection against a rolling average.

use std::sync::Arc;

use async_trait::async_trait;
use faro_core::{FaroError, MarketReader};
use faro_types::{Asset, DataKind, EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};
use crate::detectors::candle_field;

const AVG_WINDOW_DAYS: usize = 30;

/// Alerts when current volume runs a multiple of its 30-day average.
pub struct UnusualVolumeDetector {
    reader: Arc<dyn MarketReader>,
    assets: Vec<Asset>,
    multiplier: f64,
    debounce: Debouncer,
}

impl UnusualVolumeDetector {
    /// Detector over `assets` with the default 3x multiplier.
    #[must_use]
    pub fn new(reader: Arc<dyn MarketReader>, assets: Vec<Asset>) -> Self {
        Self {
            reader,
            assets,
            multiplier: 3.0,
            debounce: Debouncer::new(std::time::Duration::from_secs(300)),
        }
    }

    /// Override the spike multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    async fn average_volume(&self, asset: &Asset) -> Result<Option<f64>, FaroError> {
        let history = self.reader.latest(asset, DataKind::Ohlcv).await?;
        if !history.is_valid {
            return Ok(None);
        }
        let volumes = candle_field(&history, "volume");
        let window: Vec<f64> = volumes
            .iter()
            .rev()
            .take(AVG_WINDOW_DAYS)
            .copied()
            .collect();
        if window.is_empty() {
            return Ok(None);
        }
        Ok(Some(window.iter().sum::<f64>() / window.len() as f64))
    }
}

#[async_trait]
impl Detector for UnusualVolumeDetector {
    fn name(&self) -> &'static str {
        "unusual_volume"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for asset in &self.assets {
            let quote = self.reader.latest(asset, DataKind::Price).await?;
            if !quote.is_valid {
                continue;
            }
            let Some(current_volume) = quote.volume() else {
                continue;
            };
            let Some(avg_volume) = self.average_volume(asset).await? else {
                continue;
            };
            if avg_volume == 0.0 {
                continue;
            }

            let ratio = current_volume / avg_volume;
            if ratio <= self.multiplier {
                continue;
            }
            if !self.debounce.should_emit(&asset.symbol, EventType::UnusualVolume) {
                continue;
            }

            let severity = if ratio > 5.0 {
                Severity::Critical
            } else {
                Severity::High
            };
            let event = WatchdogEvent::new(
                EventType::UnusualVolume,
                severity,
                Some(asset.clone()),
                format!("{} volume spike: {ratio:.1}x average", asset.symbol),
            )
            .with_data("current_volume", json!(current_volume))
            .with_data("avg_volume", json!(avg_volume))
            .with_data("volume_ratio", json!(ratio))
            .with_data("price_change_pct", json!(quote.change_percent().unwrap_or(0.0)))
            .with_data("price", json!(quote.price()));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
