use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faro_core::provider::{PriceProvider, Provider};
use faro_core::{FaroError, NarrativeSource, ProviderResponse, ProviderStats};
use faro_mock::MockProvider;
use faro_types::{
    AnalysisDepth, Asset, AssetKind, ExpertiseLevel, ProviderConfig, ProviderHealth, Region,
    TaskStatus,
};
use faro::{CoinQuery, Faro, SymbolQuery};
use serde_json::{Map, Value};

fn config(name: &str, priority: u8) -> ProviderConfig {
    let mut cfg = ProviderConfig::named(name);
    cfg.priority = priority;
    cfg
}

async fn standard_gateway() -> Faro {
    Faro::builder()
        .with_provider(config("mock", 1), Arc::new(MockProvider::named("mock")))
        .with_provider(config("yahoo", 7), Arc::new(MockProvider::named("yahoo")))
        .with_provider(config("fmp", 9), Arc::new(MockProvider::named("fmp")))
        .region(Region::Us)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn equity_quick_quote_uses_the_top_provider() {
    let faro = standard_gateway().await;
    let report = faro
        .search_by_symbol(SymbolQuery::new("AAPL").depth(AnalysisDepth::Quick))
        .await;

    assert_eq!(report.symbol, "AAPL");
    assert!(report.cached.price > 0.0);
    assert_eq!(report.cached.source, "fmp");
    assert!(report.cached.confidence > 0.0);
    assert_eq!(report.data_lineage.source_count, 1);
    assert_eq!(report.data_lineage.providers_consulted, vec!["fmp"]);
    assert!(report.narrative_summary.is_none());
    assert!(report.structural_data.is_none(), "quick depth skips fundamentals");
    assert!(
        report.disclaimer.to_lowercase().contains("not financial advice"),
        "{}",
        report.disclaimer
    );
    assert_eq!(report.task.status, TaskStatus::Pending);
    assert!(faro.task(&report.task.id).is_some());
}

#[tokio::test]
async fn standard_depth_adds_structural_data() {
    let faro = standard_gateway().await;
    let report = faro.search_by_symbol(SymbolQuery::new("aapl")).await;

    assert_eq!(report.symbol, "AAPL");
    let structural = report.structural_data.expect("fundamentals expected");
    assert!(structural.market_cap.unwrap() > 0.0);
    assert_eq!(structural.sector.as_deref(), Some("Technology"));
}

/// Counting wrapper in the test-connector style: delegates to the mock and
/// tallies upstream price calls.
struct CountingProvider {
    inner: MockProvider,
    calls: Arc<std::sync::atomic::AtomicUsize>,
}

#[async_trait]
impl Provider for CountingProvider {
    fn name(&self) -> &'static str {
        "fmp"
    }
    fn supports_kind(&self, _kind: AssetKind) -> bool {
        true
    }
    fn health(&self) -> ProviderHealth {
        self.inner.health()
    }
    fn last_request(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.last_request()
    }
    fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
        Some(self as &dyn PriceProvider)
    }
}

#[async_trait]
impl PriceProvider for CountingProvider {
    async fn fetch_price(&self, asset: &Asset) -> Result<ProviderResponse, FaroError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.as_price_provider().unwrap().fetch_price(asset).await
    }
}

#[tokio::test]
async fn repeated_quick_lookups_are_served_from_cache() {
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let faro = Faro::builder()
        .with_provider(
            config("fmp", 9),
            Arc::new(CountingProvider {
                inner: MockProvider::named("fmp"),
                calls: Arc::clone(&calls),
            }),
        )
        .build()
        .await
        .unwrap();

    let query = SymbolQuery::new("AAPL").depth(AnalysisDepth::Quick);
    let first = faro.search_by_symbol(query.clone()).await;
    let second = faro.search_by_symbol(query).await;

    assert_eq!(first.cached.price, second.cached.price);
    // One upstream price call despite two requests.
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_symbols_return_a_well_formed_error_report() {
    let faro = standard_gateway().await;
    let report = faro.search_by_symbol(SymbolQuery::new("ZZZZ")).await;

    assert_eq!(report.cached.source, "error");
    assert_eq!(report.cached.price, 0.0);
    assert_eq!(report.data_lineage.source_count, 0);
    assert_eq!(report.task.status, TaskStatus::Failed);
    assert!(report.narrative_summary.is_none());
    assert!(!report.disclaimer.is_empty());
}

#[tokio::test]
async fn empty_symbols_are_rejected_gracefully() {
    let faro = standard_gateway().await;
    let report = faro.search_by_symbol(SymbolQuery::new("   ")).await;
    assert_eq!(report.cached.source, "error");
    assert!(report.disclaimer.contains("Invalid request"));
}

/// Provider that always reports an upstream rate limit.
struct RateLimitedProvider {
    stats: ProviderStats,
}

#[async_trait]
impl Provider for RateLimitedProvider {
    fn name(&self) -> &'static str {
        "ccxt_binance"
    }
    fn supports_kind(&self, _kind: AssetKind) -> bool {
        true
    }
    fn health(&self) -> ProviderHealth {
        self.stats.health("ccxt_binance")
    }
    fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
        Some(self as &dyn PriceProvider)
    }
}

#[async_trait]
impl PriceProvider for RateLimitedProvider {
    async fn fetch_price(&self, _asset: &Asset) -> Result<ProviderResponse, FaroError> {
        self.stats.record_error();
        Err(FaroError::rate_limited(
            "ccxt_binance",
            Some(Duration::from_secs(60)),
        ))
    }
}

#[tokio::test]
async fn coin_lookup_falls_back_when_the_primary_is_rate_limited() {
    let faro = Faro::builder()
        .with_provider(
            config("ccxt_binance", 9),
            Arc::new(RateLimitedProvider {
                stats: ProviderStats::new(),
            }),
        )
        .with_provider(
            config("ccxt_kraken", 5),
            Arc::new(MockProvider::named("ccxt_kraken")),
        )
        .build()
        .await
        .unwrap();

    let report = faro
        .search_by_coin(CoinQuery::new("BTC").exchange("binance"))
        .await;

    assert_eq!(report.symbol, "BTC/USDT");
    assert_eq!(report.exchange.as_deref(), Some("binance"));
    assert!(report.cached.price > 0.0);
    assert_eq!(report.cached.source, "ccxt_kraken");
    assert!(report.cached.ttl > 0);
    assert_eq!(
        report.data_lineage.providers_consulted,
        vec!["ccxt_binance", "ccxt_kraken"]
    );

    let metrics = report.crypto_metrics.expect("crypto metrics expected");
    assert!(metrics.market_cap_usd.unwrap() > 0.0);
}

/// Narrative layer that produces blatantly non-compliant text.
struct AdviceNarrative;

#[async_trait]
impl NarrativeSource for AdviceNarrative {
    async fn summarize(
        &self,
        asset: &Asset,
        _context: &Map<String, Value>,
        _language: &str,
        _expertise: ExpertiseLevel,
    ) -> Result<String, FaroError> {
        Ok(format!(
            "You should buy {} now. It will reach $500.",
            asset.symbol
        ))
    }
}

#[tokio::test]
async fn narratives_pass_through_the_guardrail() {
    let faro = Faro::builder()
        .with_provider(config("fmp", 9), Arc::new(MockProvider::named("fmp")))
        .narrative_source(Arc::new(AdviceNarrative))
        .build()
        .await
        .unwrap();

    let report = faro.search_by_symbol(SymbolQuery::new("AAPL")).await;
    let narrative = report.narrative_summary.expect("narrative expected");
    let lowered = narrative.to_lowercase();
    assert!(!lowered.contains("should buy"), "{narrative}");
    assert!(!lowered.contains("will reach"), "{narrative}");
    assert!(lowered.contains("not financial advice") || lowered.contains("informational purposes"));
}

#[tokio::test]
async fn quick_depth_never_generates_narratives() {
    let faro = Faro::builder()
        .with_provider(config("fmp", 9), Arc::new(MockProvider::named("fmp")))
        .narrative_source(Arc::new(AdviceNarrative))
        .build()
        .await
        .unwrap();

    let report = faro
        .search_by_symbol(SymbolQuery::new("AAPL").depth(AnalysisDepth::Quick))
        .await;
    assert!(report.narrative_summary.is_none());
}
