//! Seam traits for subsystems that consume market data without depending on
//! the orchestrator.

use async_trait::async_trait;

use faro_types::{Asset, DataKind, ExpertiseLevel};
use serde_json::{Map, Value};

use crate::{FaroError, ProviderResponse};

/// Narrow read surface the detector fleet uses.
///
/// Implemented by the arbitration engine; detectors depend only on this
/// trait, which keeps the watchdog crate below the orchestrator in the
/// dependency graph.
#[async_trait]
pub trait MarketReader: Send + Sync {
    /// Fetch the freshest available payload for `(asset, kind)`.
    ///
    /// Implementations run their full routing/fallback machinery; a request
    /// no provider can serve resolves to the `is_valid == false` sentinel
    /// rather than an error, mirroring the gateway contract.
    async fn latest(&self, asset: &Asset, kind: DataKind) -> Result<ProviderResponse, FaroError>;
}

/// Contract for the narrative layer, which is outside the core.
///
/// The gateway calls this when a request asks for a narrative, then runs the
/// result through the compliance guardrail before serving or caching it.
#[async_trait]
pub trait NarrativeSource: Send + Sync {
    /// Produce a narrative summary of `context` for the given audience.
    async fn summarize(
        &self,
        asset: &Asset,
        context: &Map<String, Value>,
        language: &str,
        expertise: ExpertiseLevel,
    ) -> Result<String, FaroError>;
}
