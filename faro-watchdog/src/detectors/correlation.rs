//! Rolling-correlation regime-change detection.

use std::sync::Arc;

use async_trait::async_trait;
use faro_core::{FaroError, MarketReader};
use faro_types::{Asset, DataKind, EventType, Severity, WatchdogEvent};
use serde_json::json;

use crate::base::{Debouncer, Detector};
use crate::detectors::candle_field;

const RECENT_WINDOW: usize = 7;
const HISTORY_WINDOW: usize = 90;

/// Compares 7-day and 90-day close correlations per pair; a gap beyond the
/// threshold is a decoupling event.
pub struct CorrelationBreakdownDetector {
    reader: Arc<dyn MarketReader>,
    pairs: Vec<(Asset, Asset)>,
    change_threshold: f64,
    debounce: Debouncer,
}

impl CorrelationBreakdownDetector {
    /// Detector over `pairs` with the default 0.5 change threshold.
    #[must_use]
    pub fn new(reader: Arc<dyn MarketReader>, pairs: Vec<(Asset, Asset)>) -> Self {
        Self {
            reader,
            pairs,
            change_threshold: 0.5,
            debounce: Debouncer::new(std::time::Duration::from_secs(3_600)),
        }
    }

    /// Override the correlation-change threshold.
    #[must_use]
    pub fn with_threshold(mut self, change_threshold: f64) -> Self {
        self.change_threshold = change_threshold;
        self
    }

    async fn closes(&self, asset: &Asset) -> Result<Vec<f64>, FaroError> {
        let response = self.reader.latest(asset, DataKind::Ohlcv).await?;
        if !response.is_valid {
            return Ok(Vec::new());
        }
        Ok(candle_field(&response, "close"))
    }
}

/// Pearson correlation of two equally long series; `None` when degenerate.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[a.len() - n..], &b[b.len() - n..]);

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

fn tail(series: &[f64], window: usize) -> &[f64] {
    &series[series.len().saturating_sub(window)..]
}

#[async_trait]
impl Detector for CorrelationBreakdownDetector {
    fn name(&self) -> &'static str {
        "correlation_breakdown"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for (first, second) in &self.pairs {
            let closes_a = self.closes(first).await?;
            let closes_b = self.closes(second).await?;
            if closes_a.len() < RECENT_WINDOW || closes_b.len() < RECENT_WINDOW {
                continue;
            }

            let Some(recent) = pearson(
                tail(&closes_a, RECENT_WINDOW),
                tail(&closes_b, RECENT_WINDOW),
            ) else {
                continue;
            };
            let Some(historical) = pearson(
                tail(&closes_a, HISTORY_WINDOW),
                tail(&closes_b, HISTORY_WINDOW),
            ) else {
                continue;
            };

            let change = (recent - historical).abs();
            if change <= self.change_threshold {
                continue;
            }
            if !self
                .debounce
                .should_emit(&first.symbol, EventType::CorrelationBreak)
            {
                continue;
            }

            let severity = if change > 0.7 {
                Severity::High
            } else {
                Severity::Medium
            };
            let event = WatchdogEvent::new(
                EventType::CorrelationBreak,
                severity,
                Some(first.clone()),
                format!(
                    "Correlation between {} and {} broke down",
                    first.symbol, second.symbol
                ),
            )
            .with_data("asset1", json!(first.symbol))
            .with_data("asset2", json!(second.symbol))
            .with_data("recent_corr", json!(recent))
            .with_data("hist_corr", json!(historical))
            .with_data("change", json!(change));

            return Ok(Some(event));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_of_identical_series_is_one() {
        let series = [1.0, 2.0, 3.0, 4.0];
        let corr = pearson(&series, &series).unwrap();
        assert!((corr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_inverted_series_is_minus_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [4.0, 3.0, 2.0, 1.0];
        let corr = pearson(&a, &b).unwrap();
        assert!((corr + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_series_yield_none() {
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
    }
}
