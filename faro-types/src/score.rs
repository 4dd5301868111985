//! Arbitration scoring primitives and served-response lineage.

use serde::{Deserialize, Serialize};

use crate::provider::DataKind;

/// Relative weights for the five scoring dimensions.
///
/// Weights always sum to 100 so a total score lands in `[0, 100]` when each
/// component is in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// How recently the provider served a usable value.
    pub freshness: f64,
    /// Inverse average latency.
    pub latency: f64,
    /// Provider uptime percentage.
    pub uptime: f64,
    /// Configured field coverage for the requested data kind.
    pub completeness: f64,
    /// Success rate over the tracked window.
    pub reliability: f64,
}

impl ScoreWeights {
    /// Sum of the weights; well-formed policies sum to 100.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.freshness + self.latency + self.uptime + self.completeness + self.reliability
    }
}

/// Per-data-kind weight policy.
///
/// Freshness and reliability dominate price-shaped requests; completeness
/// dominates fundamentals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScorePolicy {}

impl ScorePolicy {
    /// Weights applied when scoring providers for `kind`.
    #[must_use]
    pub fn weights_for(self, kind: DataKind) -> ScoreWeights {
        match kind {
            DataKind::Price => ScoreWeights {
                freshness: 35.0,
                latency: 15.0,
                uptime: 10.0,
                completeness: 10.0,
                reliability: 30.0,
            },
            DataKind::Ohlcv | DataKind::Technical => ScoreWeights {
                freshness: 25.0,
                latency: 15.0,
                uptime: 15.0,
                completeness: 20.0,
                reliability: 25.0,
            },
            DataKind::Fundamentals => ScoreWeights {
                freshness: 10.0,
                latency: 10.0,
                uptime: 15.0,
                completeness: 40.0,
                reliability: 25.0,
            },
            DataKind::News => ScoreWeights {
                freshness: 30.0,
                latency: 10.0,
                uptime: 15.0,
                completeness: 20.0,
                reliability: 25.0,
            },
        }
    }
}

/// A provider's computed score for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderScore {
    /// Scored provider name.
    pub provider: String,
    /// Freshness component, `[0, 100]`.
    pub freshness: f64,
    /// Latency component, `[0, 100]`.
    pub latency: f64,
    /// Uptime component, `[0, 100]`.
    pub uptime: f64,
    /// Completeness component, `[0, 100]`.
    pub completeness: f64,
    /// Reliability component, `[0, 100]`.
    pub reliability: f64,
    /// Weighted total, `[0, 100]`.
    pub total: f64,
}

/// Which providers contributed to a served value, and how it was chosen.
///
/// Attached to every served response to keep arbitration auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataLineage {
    /// Providers attempted, in attempt order.
    pub providers_consulted: Vec<String>,
    /// Total score of the provider that ultimately served the value.
    pub arbitration_score: f64,
    /// Whether conflicting values had to be reconciled.
    pub conflict_resolved: bool,
    /// Number of providers that contributed to the served value.
    pub source_count: usize,
}

impl DataLineage {
    /// Lineage for a value served by a single provider.
    #[must_use]
    pub fn single(provider: impl Into<String>, score: f64) -> Self {
        Self {
            providers_consulted: vec![provider.into()],
            arbitration_score: score,
            conflict_resolved: false,
            source_count: 1,
        }
    }

    /// Lineage for a request no provider could serve.
    #[must_use]
    pub fn failed(consulted: Vec<String>) -> Self {
        Self {
            providers_consulted: consulted,
            arbitration_score: 0.0,
            conflict_resolved: false,
            source_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_100_for_every_kind() {
        let policy = ScorePolicy::default();
        for kind in DataKind::all() {
            let total = policy.weights_for(kind).total();
            assert!(
                (total - 100.0).abs() < f64::EPSILON,
                "{kind}: weights sum to {total}"
            );
        }
    }
}
