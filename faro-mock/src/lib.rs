//! Deterministic mock provider for CI-safe tests and examples.
//!
//! Serves fixed fixtures for a handful of symbols and recognizes magic
//! symbols that force specific failure modes:
//!
//! | symbol | behavior |
//! |---|---|
//! | `FAIL` | generic `Provider` error |
//! | `TIMEOUT` | sleeps 200 ms before answering (per-provider timeouts may fire) |
//! | `RATELIMIT` | `RateLimited` with a 60 s retry hint |
//! | `RESTRICTED` | `RegionRestricted` |
//! | anything unknown | `NotFound` |

use std::time::Duration;

use async_trait::async_trait;
use faro_core::provider::{
    FundamentalsProvider, NewsProvider, OhlcvProvider, PriceProvider, Provider, Timeframe,
};
use faro_core::{FaroError, ProviderResponse, ProviderStats};
use faro_types::{Asset, AssetKind, DataKind, ProviderHealth, Region};

mod fixtures;

/// Mock provider serving deterministic data from static fixtures.
pub struct MockProvider {
    name: &'static str,
    stats: ProviderStats,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Mock with the default `"mock"` name.
    #[must_use]
    pub fn new() -> Self {
        Self::named("mock")
    }

    /// Mock masquerading under another provider name; registry and
    /// arbitration tests use this to stand in for real upstreams.
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            stats: ProviderStats::new(),
        }
    }

    async fn maybe_fail(&self, symbol: &str, capability: &'static str) -> Result<(), FaroError> {
        match symbol {
            "FAIL" => {
                self.stats.record_error();
                Err(FaroError::provider(
                    self.name,
                    format!("forced failure: {capability}"),
                ))
            }
            "TIMEOUT" => {
                // Long enough for short orchestrator timeouts to fire, short
                // enough to keep tests fast.
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }
            "RATELIMIT" => {
                self.stats.record_error();
                Err(FaroError::rate_limited(
                    self.name,
                    Some(Duration::from_secs(60)),
                ))
            }
            "RESTRICTED" => {
                self.stats.record_error();
                Err(FaroError::region_restricted(self.name, Region::Global))
            }
            _ => Ok(()),
        }
    }

    fn respond(
        &self,
        asset: &Asset,
        kind: DataKind,
        data: Option<serde_json::Map<String, serde_json::Value>>,
        what: &str,
    ) -> Result<ProviderResponse, FaroError> {
        match data {
            Some(data) => {
                self.stats.record_success(Duration::from_millis(12));
                Ok(ProviderResponse::new(self.name, asset.clone(), kind, data)
                    .with_confidence(0.97))
            }
            None => {
                self.stats.record_error();
                Err(FaroError::not_found(format!(
                    "{what} for {}",
                    asset.symbol
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports_kind(&self, _kind: AssetKind) -> bool {
        true
    }

    fn health(&self) -> ProviderHealth {
        self.stats.health(self.name)
    }

    fn last_request(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.stats.last_request()
    }

    fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
        Some(self as &dyn PriceProvider)
    }
    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        Some(self as &dyn OhlcvProvider)
    }
    fn as_fundamentals_provider(&self) -> Option<&dyn FundamentalsProvider> {
        Some(self as &dyn FundamentalsProvider)
    }
    fn as_news_provider(&self) -> Option<&dyn NewsProvider> {
        Some(self as &dyn NewsProvider)
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    async fn fetch_price(&self, asset: &Asset) -> Result<ProviderResponse, FaroError> {
        self.maybe_fail(&asset.symbol, "price").await?;
        self.respond(
            asset,
            DataKind::Price,
            fixtures::price(&asset.symbol),
            "price",
        )
    }
}

#[async_trait]
impl OhlcvProvider for MockProvider {
    async fn fetch_ohlcv(
        &self,
        asset: &Asset,
        _timeframe: Timeframe,
        limit: usize,
    ) -> Result<ProviderResponse, FaroError> {
        self.maybe_fail(&asset.symbol, "ohlcv").await?;
        self.respond(
            asset,
            DataKind::Ohlcv,
            fixtures::ohlcv(&asset.symbol, limit),
            "ohlcv",
        )
    }
}

#[async_trait]
impl FundamentalsProvider for MockProvider {
    async fn fetch_fundamentals(&self, asset: &Asset) -> Result<ProviderResponse, FaroError> {
        self.maybe_fail(&asset.symbol, "fundamentals").await?;
        self.respond(
            asset,
            DataKind::Fundamentals,
            fixtures::fundamentals(&asset.symbol),
            "fundamentals",
        )
    }
}

#[async_trait]
impl NewsProvider for MockProvider {
    async fn fetch_news(
        &self,
        asset: &Asset,
        limit: usize,
    ) -> Result<ProviderResponse, FaroError> {
        self.maybe_fail(&asset.symbol, "news").await?;
        self.respond(
            asset,
            DataKind::News,
            fixtures::news(&asset.symbol, limit),
            "news",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_fixture_prices() {
        let mock = MockProvider::new();
        let asset = Asset::new("AAPL", AssetKind::Equity).unwrap();
        let resp = mock.fetch_price(&asset).await.unwrap();
        assert!(resp.is_valid);
        assert_eq!(resp.provider, "mock");
        assert!(resp.price().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let mock = MockProvider::new();
        let asset = Asset::new("ZZZZ", AssetKind::Equity).unwrap();
        let err = mock.fetch_price(&asset).await.unwrap_err();
        assert!(matches!(err, FaroError::NotFound { .. }));
    }

    #[tokio::test]
    async fn magic_symbols_force_failures() {
        let mock = MockProvider::new();
        let ratelimit = Asset::new("RATELIMIT", AssetKind::Equity).unwrap();
        assert!(matches!(
            mock.fetch_price(&ratelimit).await.unwrap_err(),
            FaroError::RateLimited { .. }
        ));

        let restricted = Asset::new("RESTRICTED", AssetKind::Equity).unwrap();
        assert!(matches!(
            mock.fetch_price(&restricted).await.unwrap_err(),
            FaroError::RegionRestricted { .. }
        ));
    }
}
