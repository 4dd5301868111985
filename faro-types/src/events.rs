//! Watchdog event model: types, severities, events and subscriber filters.

use core::fmt;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::asset::Asset;

/// Types of anomalies the detector fleet publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventType {
    /// Actual earnings diverged sharply from estimates.
    EarningsAnomaly,
    /// Traded volume far above its rolling average.
    UnusualVolume,
    /// Large on-chain transfer.
    WhaleMovement,
    /// Extreme perpetual funding rate.
    FundingSpike,
    /// Order-book depth collapse.
    LiquidityDrop,
    /// Rolling correlation regime change.
    CorrelationBreak,
    /// Exchange outage or degradation.
    ExchangeOutage,
    /// Rapid price movement.
    PriceAnomaly,
    /// Severe, fast drawdown.
    FlashCrash,
    /// Cross-venue price dislocation.
    ArbitrageOpportunity,
}

impl EventType {
    /// Stable snake_case identifier used in the durable log and counters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarningsAnomaly => "earnings_anomaly",
            Self::UnusualVolume => "unusual_volume",
            Self::WhaleMovement => "whale_movement",
            Self::FundingSpike => "funding_spike",
            Self::LiquidityDrop => "liquidity_drop",
            Self::CorrelationBreak => "correlation_break",
            Self::ExchangeOutage => "exchange_outage",
            Self::PriceAnomaly => "price_anomaly",
            Self::FlashCrash => "flash_crash",
            Self::ArbitrageOpportunity => "arbitrage_opportunity",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth a look.
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Critical,
}

impl Severity {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured event emitted by a watchdog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Category of anomaly.
    pub event_type: EventType,
    /// Urgency.
    pub severity: Severity,
    /// Affected asset; infrastructure events carry `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
    /// Human-readable summary.
    pub description: String,
    /// Detector-specific payload.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Name of the emitting watchdog; stamped by the runner.
    pub watchdog: String,
    /// Free-form annotations.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WatchdogEvent {
    /// Build an event with a fresh id and the current timestamp.
    ///
    /// The `watchdog` field is left empty; the runner stamps it on emission.
    #[must_use]
    pub fn new(
        event_type: EventType,
        severity: Severity,
        asset: Option<Asset>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_id: format!("evt_{}", Uuid::new_v4().simple()),
            event_type,
            severity,
            asset,
            description: description.into(),
            data: Map::new(),
            timestamp: Utc::now(),
            watchdog: String::new(),
            metadata: Map::new(),
        }
    }

    /// Attach one payload field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Symbol of the affected asset, if any.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.asset.as_ref().map(|a| a.symbol.as_str())
    }

    /// Flat string-keyed map used by the append-only durable log.
    #[must_use]
    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        out.insert("event_id".into(), self.event_id.clone());
        out.insert("type".into(), self.event_type.as_str().into());
        out.insert("severity".into(), self.severity.as_str().into());
        if let Some(asset) = &self.asset {
            out.insert("symbol".into(), asset.symbol.clone());
            out.insert("asset_kind".into(), asset.kind.as_str().into());
        }
        out.insert("description".into(), self.description.clone());
        out.insert("timestamp".into(), self.timestamp.to_rfc3339());
        out.insert("watchdog".into(), self.watchdog.clone());
        if !self.data.is_empty() {
            out.insert("data".into(), Value::Object(self.data.clone()).to_string());
        }
        out
    }
}

/// Predicate restricting which events a subscriber receives.
///
/// Omitted dimensions are wildcards; listed dimensions are ANDed together and
/// OR within each list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventFilter {
    /// Match any of these event types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<EventType>>,
    /// Match any of these severities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severities: Option<Vec<Severity>>,
    /// Match any of these asset symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_symbols: Option<Vec<String>>,
    /// Match any of these watchdog names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchdog_names: Option<Vec<String>>,
}

impl EventFilter {
    /// A filter matching every event.
    #[must_use]
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Restrict to the given severities.
    #[must_use]
    pub fn with_severities(mut self, severities: impl Into<Vec<Severity>>) -> Self {
        self.severities = Some(severities.into());
        self
    }

    /// Restrict to the given event types.
    #[must_use]
    pub fn with_event_types(mut self, types: impl Into<Vec<EventType>>) -> Self {
        self.event_types = Some(types.into());
        self
    }

    /// Restrict to the given symbols.
    #[must_use]
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `event` satisfies every specified dimension.
    #[must_use]
    pub fn matches(&self, event: &WatchdogEvent) -> bool {
        if let Some(types) = &self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }
        if let Some(severities) = &self.severities
            && !severities.contains(&event.severity)
        {
            return false;
        }
        if let Some(symbols) = &self.asset_symbols
            && let Some(asset) = &event.asset
            && !symbols.iter().any(|s| s == &asset.symbol)
        {
            return false;
        }
        if let Some(names) = &self.watchdog_names
            && !names.iter().any(|n| n == &event.watchdog)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;

    fn event(severity: Severity) -> WatchdogEvent {
        let mut e = WatchdogEvent::new(
            EventType::PriceAnomaly,
            severity,
            Some(Asset::new("TSLA", AssetKind::Equity).unwrap()),
            "rapid move",
        );
        e.watchdog = "price_anomaly".into();
        e
    }

    #[test]
    fn omitted_dimensions_are_wildcards() {
        assert!(EventFilter::match_all().matches(&event(Severity::Low)));
    }

    #[test]
    fn dimensions_are_anded() {
        let filter = EventFilter::match_all()
            .with_severities([Severity::High, Severity::Critical])
            .with_symbols(["TSLA"]);
        assert!(filter.matches(&event(Severity::High)));
        assert!(!filter.matches(&event(Severity::Low)));

        let other_symbol = filter.clone().with_symbols(["AAPL"]);
        assert!(!other_symbol.matches(&event(Severity::High)));
    }

    #[test]
    fn assetless_event_passes_symbol_filter() {
        let filter = EventFilter::match_all().with_symbols(["TSLA"]);
        let mut e = event(Severity::High);
        e.asset = None;
        assert!(filter.matches(&e));
    }
}
