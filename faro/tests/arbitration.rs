use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faro_core::provider::{PriceProvider, Provider};
use faro_core::{FaroError, MarketReader, ProviderResponse, ProviderStats};
use faro_mock::MockProvider;
use faro_types::{Asset, AssetKind, DataKind, ProviderConfig, ProviderHealth, Region};
use faro::arbitration::ArbitrationEngine;
use faro::registry::RegistryBuilder;

fn config(name: &str, priority: u8) -> ProviderConfig {
    let mut cfg = ProviderConfig::named(name);
    cfg.priority = priority;
    cfg
}

fn aapl() -> Asset {
    Asset::new("AAPL", AssetKind::Equity).unwrap()
}

/// Provider that always reports an upstream rate limit.
struct RateLimitedProvider {
    name: &'static str,
    stats: ProviderStats,
}

impl RateLimitedProvider {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            stats: ProviderStats::new(),
        }
    }
}

#[async_trait]
impl Provider for RateLimitedProvider {
    fn name(&self) -> &'static str {
        self.name
    }
    fn supports_kind(&self, _kind: AssetKind) -> bool {
        true
    }
    fn health(&self) -> ProviderHealth {
        self.stats.health(self.name)
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
            self.name,
            Some(Duration::from_secs(60)),
        ))
    }
}

/// Provider that refuses this caller's region.
struct RestrictedProvider;

#[async_trait]
impl Provider for RestrictedProvider {
    fn name(&self) -> &'static str {
        "restricted"
    }
    fn supports_kind(&self, _kind: AssetKind) -> bool {
        true
    }
    fn health(&self) -> ProviderHealth {
        ProviderHealth {
            name: "restricted".into(),
            is_healthy: true,
            uptime_percent: 100.0,
            avg_latency_ms: 10.0,
            success_rate: 1.0,
            last_check: chrono::Utc::now(),
            error_count_24h: 0,
        }
    }
    fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
        Some(self as &dyn PriceProvider)
    }
}

#[async_trait]
impl PriceProvider for RestrictedProvider {
    async fn fetch_price(&self, _asset: &Asset) -> Result<ProviderResponse, FaroError> {
        Err(FaroError::region_restricted("restricted", Region::Us))
    }
}

async fn three_provider_engine() -> ArbitrationEngine {
    let registry = RegistryBuilder::new()
        .with_provider(config("mock", 1), Arc::new(MockProvider::named("mock")))
        .with_provider(config("yahoo", 7), Arc::new(MockProvider::named("yahoo")))
        .with_provider(config("fmp", 9), Arc::new(MockProvider::named("fmp")))
        .build()
        .await
        .unwrap();
    ArbitrationEngine::new(Arc::new(registry), Region::Us)
}

#[tokio::test]
async fn plan_primary_has_the_maximum_score() {
    let engine = three_provider_engine().await;
    let plan = engine.arbitrate(&aapl(), DataKind::Price, Region::Us).unwrap();

    // Equal health means scores tie and static priority decides.
    assert_eq!(plan.primary_name(), "fmp");
    let fallback_names: Vec<_> = plan.fallbacks.iter().map(|p| p.name()).collect();
    assert_eq!(fallback_names, vec!["yahoo", "mock"]);

    let best = plan.scores[0].total;
    assert!(plan.scores.iter().all(|s| s.total <= best));
    assert!(plan.scores.iter().all(|s| (0.0..=100.0).contains(&s.total)));
    assert_eq!(plan.scores[0].provider, "fmp");
}

#[tokio::test]
async fn unreliable_providers_score_below_healthy_ones() {
    let flaky = Arc::new(MockProvider::named("flaky"));
    // Damage the success rate before building the registry view.
    let fail = Asset::new("FAIL", AssetKind::Equity).unwrap();
    for _ in 0..5 {
        let _ = flaky.as_price_provider().unwrap().fetch_price(&fail).await;
    }

    let registry = RegistryBuilder::new()
        .with_provider(config("flaky", 9), flaky)
        .with_provider(config("steady", 2), Arc::new(MockProvider::named("steady")))
        .build()
        .await
        .unwrap();
    let engine = ArbitrationEngine::new(Arc::new(registry), Region::Us);

    let plan = engine.arbitrate(&aapl(), DataKind::Price, Region::Us).unwrap();
    assert_eq!(
        plan.primary_name(),
        "steady",
        "reliability should outweigh static priority"
    );
}

#[tokio::test]
async fn rate_limited_primary_falls_back_serially() {
    let registry = RegistryBuilder::new()
        .with_provider(
            config("ccxt_binance", 9),
            Arc::new(RateLimitedProvider::new("ccxt_binance")),
        )
        .with_provider(
            config("ccxt_kraken", 5),
            Arc::new(MockProvider::named("ccxt_kraken")),
        )
        .build()
        .await
        .unwrap();
    let engine = ArbitrationEngine::new(Arc::new(registry), Region::Us);

    let btc = Asset::new("BTC", AssetKind::Crypto).unwrap();
    let plan = engine.arbitrate(&btc, DataKind::Price, Region::Us).unwrap();
    assert_eq!(plan.primary_name(), "ccxt_binance");

    let outcome = engine.execute_with_fallback(&plan).await;
    assert!(outcome.response.is_valid);
    assert_eq!(outcome.response.provider, "ccxt_kraken");
    assert_eq!(
        outcome.lineage.providers_consulted,
        vec!["ccxt_binance", "ccxt_kraken"]
    );
    assert_eq!(outcome.lineage.source_count, 1);
}

#[tokio::test]
async fn regional_restriction_removes_the_provider_from_candidacy() {
    let registry = RegistryBuilder::new()
        .with_provider(config("restricted", 9), Arc::new(RestrictedProvider))
        .with_provider(config("mock", 2), Arc::new(MockProvider::named("mock")))
        .build()
        .await
        .unwrap();
    let engine = ArbitrationEngine::new(Arc::new(registry), Region::Us);
    let asset = aapl();

    // First round: the restricted provider is attempted and penalized.
    let outcome = engine.fetch(&asset, DataKind::Price, Region::Us).await.unwrap();
    assert_eq!(outcome.response.provider, "mock");
    assert_eq!(outcome.lineage.providers_consulted.len(), 2);

    // Second round: it is no longer a candidate for this region.
    let plan = engine.arbitrate(&asset, DataKind::Price, Region::Us).unwrap();
    assert_eq!(plan.primary_name(), "mock");
    assert!(plan.fallbacks.is_empty());

    // A different region is unaffected: both providers remain candidates.
    let plan_eu = engine.arbitrate(&asset, DataKind::Price, Region::Eu).unwrap();
    assert_eq!(plan_eu.fallbacks.len() + 1, 2);
}

#[tokio::test]
async fn exhausted_plans_return_the_sentinel_response() {
    let engine = three_provider_engine().await;
    let missing = Asset::new("ZZZZ", AssetKind::Equity).unwrap();

    let outcome = engine.fetch(&missing, DataKind::Price, Region::Us).await.unwrap();
    assert!(!outcome.response.is_valid);
    assert_eq!(outcome.response.provider, "error");
    assert_eq!(outcome.lineage.source_count, 0);
    assert_eq!(outcome.lineage.providers_consulted.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_providers_are_timed_out_and_skipped() {
    /// Provider that never answers within any reasonable budget.
    struct GlacialProvider;

    #[async_trait]
    impl Provider for GlacialProvider {
        fn name(&self) -> &'static str {
            "glacial"
        }
        fn supports_kind(&self, _kind: AssetKind) -> bool {
            true
        }
        fn health(&self) -> ProviderHealth {
            ProviderHealth {
                name: "glacial".into(),
                is_healthy: true,
                uptime_percent: 100.0,
                avg_latency_ms: 5.0,
                success_rate: 1.0,
                last_check: chrono::Utc::now(),
                error_count_24h: 0,
            }
        }
        fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
            Some(self as &dyn PriceProvider)
        }
    }

    #[async_trait]
    impl PriceProvider for GlacialProvider {
        async fn fetch_price(&self, _asset: &Asset) -> Result<ProviderResponse, FaroError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            unreachable!("the arbitration timeout must fire first");
        }
    }

    let registry = RegistryBuilder::new()
        .with_provider(config("glacial", 9), Arc::new(GlacialProvider))
        .with_provider(config("mock", 2), Arc::new(MockProvider::named("mock")))
        .build()
        .await
        .unwrap();
    let engine = ArbitrationEngine::new(Arc::new(registry), Region::Us);

    let outcome = engine.fetch(&aapl(), DataKind::Price, Region::Us).await.unwrap();
    assert!(outcome.response.is_valid);
    assert_eq!(outcome.response.provider, "mock");
}

#[tokio::test]
async fn market_reader_degrades_to_the_sentinel() {
    let engine = three_provider_engine().await;
    let bond = Asset::new("XS123", AssetKind::Bond).unwrap();

    // Every registered provider claims all kinds, so force the no-provider
    // path with a kind-restricted registry instead.
    struct EquityOnly(MockProvider);

    #[async_trait]
    impl Provider for EquityOnly {
        fn name(&self) -> &'static str {
            "equity_only"
        }
        fn supports_kind(&self, kind: AssetKind) -> bool {
            kind == AssetKind::Equity
        }
        fn health(&self) -> ProviderHealth {
            self.0.health()
        }
        fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
            self.0.as_price_provider()
        }
    }

    let registry = RegistryBuilder::new()
        .with_provider(
            config("equity_only", 5),
            Arc::new(EquityOnly(MockProvider::named("equity_only"))),
        )
        .build()
        .await
        .unwrap();
    let narrow = ArbitrationEngine::new(Arc::new(registry), Region::Us);

    let sentinel = narrow.latest(&bond, DataKind::Price).await.unwrap();
    assert!(!sentinel.is_valid);
    assert_eq!(sentinel.provider, "error");

    // The broad engine serves the same call normally.
    let served = engine.latest(&aapl(), DataKind::Price).await.unwrap();
    assert!(served.is_valid);
}
