//! Order-book depth collapse detection.

use std::sync::Arc;

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::{Asset, EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};
use crate::detectors::sources::DepthSource;

const REFERENCE_DAYS: u32 = 7;

/// Alerts when book depth drops below half of its 7-day average.
pub struct LiquidityDropDetector {
    source: Arc<dyn DepthSource>,
    assets: Vec<Asset>,
    drop_ratio: f64,
    debounce: Debouncer,
}

impl LiquidityDropDetector {
    /// Detector over `assets` with the default 50% drop trigger.
    #[must_use]
    pub fn new(source: Arc<dyn DepthSource>, assets: Vec<Asset>) -> Self {
        Self {
            source,
            assets,
            drop_ratio: 0.5,
            debounce: Debouncer::new(std::time::Duration::from_secs(900)),
        }
    }

    /// Override the depth-ratio trigger (current/average below this fires).
    #[must_use]
    pub fn with_drop_ratio(mut self, drop_ratio: f64) -> Self {
        self.drop_ratio = drop_ratio;
        self
    }
}

#[async_trait]
impl Detector for LiquidityDropDetector {
    fn name(&self) -> &'static str {
        "liquidity_drop"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for asset in &self.assets {
            let current = self.source.order_book_depth(asset).await?;
            let average = self.source.average_depth(asset, REFERENCE_DAYS).await?;
            if average == 0.0 {
                continue;
            }

            let ratio = current / average;
            if ratio >= self.drop_ratio {
                continue;
            }
            if !self.debounce.should_emit(&asset.symbol, EventType::LiquidityDrop) {
                continue;
            }

            let severity = if ratio < 0.3 {
                Severity::Critical
            } else {
                Severity::High
            };
            let event = WatchdogEvent::new(
                EventType::LiquidityDrop,
                severity,
                Some(asset.clone()),
                format!(
                    "{} liquidity dropped {:.0}%",
                    asset.symbol,
                    (1.0 - ratio) * 100.0
                ),
            )
            .with_data("current_depth", json!(current))
            .with_data("avg_depth", json!(average))
            .with_data("drop_pct", json!((1.0 - ratio) * 100.0))
            .with_data("depth_ratio", json!(ratio));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
