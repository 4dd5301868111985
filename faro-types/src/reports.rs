//! Report envelopes produced by the gateway surface.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::DataLineage;

/// How much work a search request is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    /// Cached price only.
    Quick,
    /// Price plus fundamentals/technicals.
    #[default]
    Standard,
    /// Everything, plus an asynchronous deep-analysis task.
    Deep,
}

/// Reader sophistication hint forwarded to narrative generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    /// New to markets.
    Beginner,
    /// Comfortable with common terms.
    #[default]
    Intermediate,
    /// Fluent in market mechanics.
    Advanced,
    /// Wants the raw numbers.
    Quant,
}

impl ExpertiseLevel {
    /// Stable identifier used in narrative cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Quant => "quant",
        }
    }
}

impl fmt::Display for ExpertiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The instantly-served, cache-backed slice of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedQuote {
    /// Last price.
    pub price: f64,
    /// Absolute change.
    pub change: f64,
    /// Percent change.
    pub change_percent: f64,
    /// Data as-of time.
    pub as_of: DateTime<Utc>,
    /// Serving provider name, or `"error"` when every provider failed.
    pub source: String,
    /// TTL the value was cached with, in seconds.
    pub ttl: u64,
    /// Serving provider's confidence, `[0, 1]`.
    pub confidence: f64,
}

impl CachedQuote {
    /// Sentinel quote for a request no provider could serve.
    #[must_use]
    pub fn error() -> Self {
        Self {
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            as_of: Utc::now(),
            source: "error".into(),
            ttl: 0,
            confidence: 0.0,
        }
    }
}

/// Slower-moving structural facts about an equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StructuralData {
    /// Market capitalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    /// Trailing P/E.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    /// Beta vs the broad market.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Average daily volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<f64>,
    /// 52-week high.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_52_high: Option<f64>,
    /// 52-week low.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_52_low: Option<f64>,
    /// Sector label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Industry label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// Crypto-specific market structure facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CryptoMetrics {
    /// Market capitalization in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_usd: Option<f64>,
    /// 24h traded volume in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h_usd: Option<f64>,
    /// 24h percent change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h_percent: Option<f64>,
    /// Circulating supply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulating_supply: Option<f64>,
    /// Current funding rate, when derivatives data is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_rate: Option<f64>,
}

/// Lifecycle states of an asynchronous analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, not started.
    Pending,
    /// In progress.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Completed with an error.
    Failed,
}

/// Pollable handle for an asynchronous deep analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Task identifier.
    pub id: String,
    /// Task category, e.g. `equity_analysis`.
    pub task_type: String,
    /// Current status.
    pub status: TaskStatus,
    /// Where to poll for the result.
    pub resource_url: String,
    /// Estimated completion time.
    pub estimated_completion: DateTime<Utc>,
    /// Progress, `[0, 1]`.
    pub progress: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TaskInfo {
    /// A pending task of the given type expected to finish in `eta_seconds`.
    #[must_use]
    pub fn pending(id: impl Into<String>, task_type: impl Into<String>, eta_seconds: i64) -> Self {
        let id = id.into();
        let now = Utc::now();
        Self {
            resource_url: format!("faro://task/{id}"),
            id,
            task_type: task_type.into(),
            status: TaskStatus::Pending,
            estimated_completion: now + chrono::Duration::seconds(eta_seconds),
            progress: 0.0,
            created_at: now,
        }
    }

    /// A failed placeholder task (compliance-blocked or erroring requests).
    #[must_use]
    pub fn failed(task_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            task_type: task_type.into(),
            status: TaskStatus::Failed,
            resource_url: String::new(),
            estimated_completion: now,
            progress: 0.0,
            created_at: now,
        }
    }
}

/// Response envelope for `search_by_symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    /// Normalized symbol.
    pub symbol: String,
    /// Market label.
    pub market: String,
    /// Quote currency.
    pub currency: String,
    /// Instantly-served cached slice.
    pub cached: CachedQuote,
    /// Structural facts, present for standard/deep requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_data: Option<StructuralData>,
    /// Handle for the asynchronous deep analysis.
    pub task: TaskInfo,
    /// Providers behind the served value.
    pub data_lineage: DataLineage,
    /// Regionally appropriate disclaimer.
    pub disclaimer: String,
    /// Guardrail-processed narrative, when requested and available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_summary: Option<String>,
}

/// Response envelope for `search_by_coin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinReport {
    /// Normalized symbol (pair form when an exchange pair was requested).
    pub symbol: String,
    /// Exchange the pair was routed to, when specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Instantly-served cached slice.
    pub cached: CachedQuote,
    /// Crypto market structure, present for standard/deep requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_metrics: Option<CryptoMetrics>,
    /// Handle for the asynchronous deep analysis.
    pub task: TaskInfo,
    /// Providers behind the served value.
    pub data_lineage: DataLineage,
    /// Regionally appropriate disclaimer.
    pub disclaimer: String,
    /// Guardrail-processed narrative, when requested and available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_summary: Option<String>,
}
