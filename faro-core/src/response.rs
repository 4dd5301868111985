//! The uniform response envelope providers return.

use chrono::{DateTime, Utc};
use faro_types::{Asset, DataKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One provider's answer to one fetch.
///
/// Payloads are free-form maps because field sets vary widely across
/// upstreams; well-known fields have typed accessors. When `is_valid` is
/// false the payload must not be used — the arbitration engine produces such
/// sentinels when every provider fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Name of the provider that produced the response.
    pub provider: String,
    /// Asset the response refers to.
    pub asset: Asset,
    /// Data kind served.
    pub kind: DataKind,
    /// Provider payload; keys are provider-normalized (e.g. `price`,
    /// `change_percent`, `volume`, `candles`, `articles`).
    pub data: Map<String, Value>,
    /// When the provider produced the value.
    pub timestamp: DateTime<Utc>,
    /// Whether the payload is usable.
    pub is_valid: bool,
    /// Whether the payload is fresh rather than provider-side cached.
    pub is_fresh: bool,
    /// Provider's confidence in the payload, `[0, 1]`.
    pub confidence: f64,
    /// Free-form annotations (lineage stamps land here).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ProviderResponse {
    /// A valid, fresh response.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        asset: Asset,
        kind: DataKind,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            provider: provider.into(),
            asset,
            kind,
            data,
            timestamp: Utc::now(),
            is_valid: true,
            is_fresh: true,
            confidence: 1.0,
            metadata: Map::new(),
        }
    }

    /// The sentinel returned when every provider in a plan failed.
    ///
    /// Callers decide whether to surface it as a failed lineage or an error;
    /// it never carries usable data (`is_valid == false`,
    /// `provider == "error"`).
    #[must_use]
    pub fn error_response(asset: Asset, kind: DataKind, reason: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("error".into(), Value::String(reason.into()));
        Self {
            provider: "error".into(),
            asset,
            kind,
            data,
            timestamp: Utc::now(),
            is_valid: false,
            is_fresh: false,
            confidence: 0.0,
            metadata: Map::new(),
        }
    }

    /// Builder-style confidence override.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Numeric field accessor.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    /// Last price, when present.
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        self.number("price")
    }

    /// Absolute change, when present.
    #[must_use]
    pub fn change(&self) -> Option<f64> {
        self.number("change")
    }

    /// Percent change, when present.
    #[must_use]
    pub fn change_percent(&self) -> Option<f64> {
        self.number("change_percent")
    }

    /// Traded volume, when present.
    #[must_use]
    pub fn volume(&self) -> Option<f64> {
        self.number("volume")
    }
}
