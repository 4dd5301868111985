//! Large on-chain transfer detection.

use std::sync::Arc;

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::{EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};
use crate::detectors::sources::TransferFeed;

/// Alerts on transfers above a USD notional threshold.
pub struct WhaleMovementDetector {
    feed: Arc<dyn TransferFeed>,
    threshold_usd: f64,
    debounce: Debouncer,
}

impl WhaleMovementDetector {
    /// Detector with the default $1M threshold.
    #[must_use]
    pub fn new(feed: Arc<dyn TransferFeed>) -> Self {
        Self {
            feed,
            threshold_usd: 1_000_000.0,
            debounce: Debouncer::new(std::time::Duration::from_secs(600)),
        }
    }

    /// Override the notional threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold_usd: f64) -> Self {
        self.threshold_usd = threshold_usd;
        self
    }
}

#[async_trait]
impl Detector for WhaleMovementDetector {
    fn name(&self) -> &'static str {
        "whale_movement"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        let transfers = self.feed.recent_transfers().await?;
        for transfer in transfers {
            if transfer.amount_usd < self.threshold_usd {
                continue;
            }
            if !self
                .debounce
                .should_emit(&transfer.asset.symbol, EventType::WhaleMovement)
            {
                continue;
            }

            let severity = if transfer.amount_usd >= 10.0 * self.threshold_usd {
                Severity::Critical
            } else {
                Severity::High
            };
            let event = WatchdogEvent::new(
                EventType::WhaleMovement,
                severity,
                Some(transfer.asset.clone()),
                format!(
                    "{} whale transfer: ${:.1}M",
                    transfer.asset.symbol,
                    transfer.amount_usd / 1_000_000.0
                ),
            )
            .with_data("amount_usd", json!(transfer.amount_usd))
            .with_data("from", json!(transfer.from))
            .with_data("to", json!(transfer.to))
            .with_data("tx_id", json!(transfer.tx_id));

            return Ok(Some(event));
        }
        Ok(None)
    }
}
