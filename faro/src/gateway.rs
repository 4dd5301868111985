//! The request surface: explicit application context, builder, and the
//! `search_by_symbol` / `search_by_coin` operations.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use faro_core::provider::Provider;
use faro_core::{FaroError, MarketReader, NarrativeSource};
use faro_guardrail::{ComplianceGuardrail, GuardrailConfig, Language};
use faro_types::{
    AnalysisDepth, Asset, AssetKind, CacheEntry, CachePolicy, CachedQuote, CoinReport,
    CryptoMetrics, DataKind, DataLineage, ExpertiseLevel, ProviderConfig, Region, StructuralData,
    SymbolReport, TaskInfo,
};
use faro_watchdog::EventStream;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::arbitration::ArbitrationEngine;
use crate::cache::{CacheManager, CacheTier, Fetched, cache_key, narrative_key};
use crate::registry::{ProviderFactories, ProviderRegistry, RegistryBuilder};
use crate::tasks::TaskRegistry;
use crate::{settings::Settings, ttl};

/// Parameters for an equity lookup.
#[derive(Debug, Clone)]
pub struct SymbolQuery {
    /// Ticker symbol.
    pub symbol: String,
    /// Market label, default `US`.
    pub market: String,
    /// Analysis depth.
    pub depth: AnalysisDepth,
    /// Response language code.
    pub language: String,
    /// Reader sophistication for narratives.
    pub expertise: ExpertiseLevel,
    /// Whether to produce a narrative (quick depth never does).
    pub include_narrative: bool,
    /// Session id for context tracking, opaque to the core.
    pub session_id: Option<String>,
}

impl SymbolQuery {
    /// Query with the standard defaults.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market: "US".into(),
            depth: AnalysisDepth::Standard,
            language: "en".into(),
            expertise: ExpertiseLevel::default(),
            include_narrative: true,
            session_id: None,
        }
    }

    /// Override the depth.
    #[must_use]
    pub fn depth(mut self, depth: AnalysisDepth) -> Self {
        self.depth = depth;
        self
    }
}

/// Parameters for a crypto lookup.
#[derive(Debug, Clone)]
pub struct CoinQuery {
    /// Coin symbol, bare (`BTC`) or pair (`BTC/USDT`).
    pub symbol: String,
    /// Preferred exchange, empty for any.
    pub exchange: String,
    /// Quote leg used to display the pair, e.g. `USDT`.
    pub pair: String,
    /// Analysis depth.
    pub depth: AnalysisDepth,
    /// Response language code.
    pub language: String,
    /// Reader sophistication for narratives.
    pub expertise: ExpertiseLevel,
    /// Whether to produce a narrative (quick depth never does).
    pub include_narrative: bool,
    /// Session id for context tracking, opaque to the core.
    pub session_id: Option<String>,
}

impl CoinQuery {
    /// Query with the standard defaults.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: String::new(),
            pair: "USDT".into(),
            depth: AnalysisDepth::Standard,
            language: "en".into(),
            expertise: ExpertiseLevel::default(),
            include_narrative: true,
            session_id: None,
        }
    }

    /// Override the exchange.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    /// Override the depth.
    #[must_use]
    pub fn depth(mut self, depth: AnalysisDepth) -> Self {
        self.depth = depth;
        self
    }
}

/// Builder for the [`Faro`] application context.
pub struct FaroBuilder {
    registry: RegistryBuilder,
    region: Region,
    cache_policy: CachePolicy,
    cache_capacity: u64,
    guardrail_config: GuardrailConfig,
    narrative: Option<Arc<dyn NarrativeSource>>,
    l2: Option<Arc<dyn CacheTier>>,
    penalty_window: Option<Duration>,
}

impl FaroBuilder {
    fn new() -> Self {
        Self {
            registry: RegistryBuilder::new(),
            region: Region::Us,
            cache_policy: CachePolicy::default(),
            cache_capacity: 10_000,
            guardrail_config: GuardrailConfig::default(),
            narrative: None,
            l2: None,
            penalty_window: None,
        }
    }

    /// Seed region, cache and guardrail knobs from resolved settings.
    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.region = settings.default_region;
        self.cache_policy = settings.cache_policy.clone();
        self.cache_capacity = settings.cache_capacity;
        self.guardrail_config = settings.guardrail.clone();
        self
    }

    /// Register a constructed provider under its configuration.
    #[must_use]
    pub fn with_provider(mut self, config: ProviderConfig, provider: Arc<dyn Provider>) -> Self {
        self.registry = self.registry.with_provider(config, provider);
        self
    }

    /// Construct providers from a factory table and configurations.
    #[must_use]
    pub fn with_factories(
        mut self,
        factories: ProviderFactories,
        configs: Vec<ProviderConfig>,
    ) -> Self {
        self.registry = self.registry.with_factories(factories, configs);
        self
    }

    /// Default caller region.
    #[must_use]
    pub const fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Override the cache TTL bands.
    #[must_use]
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Override the guardrail configuration.
    #[must_use]
    pub fn guardrail(mut self, config: GuardrailConfig) -> Self {
        self.guardrail_config = config;
        self
    }

    /// Attach the narrative layer.
    #[must_use]
    pub fn narrative_source(mut self, source: Arc<dyn NarrativeSource>) -> Self {
        self.narrative = Some(source);
        self
    }

    /// Attach a durable L2 cache tier.
    #[must_use]
    pub fn l2_cache(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.l2 = Some(tier);
        self
    }

    /// Override the regional-restriction penalty window.
    #[must_use]
    pub const fn penalty_window(mut self, window: Duration) -> Self {
        self.penalty_window = Some(window);
        self
    }

    /// Construct the context: build and initialize the registry, then wire
    /// the engine and cache manager over it.
    ///
    /// # Errors
    /// `Config` when no provider could be registered.
    pub async fn build(self) -> Result<Faro, FaroError> {
        let registry = Arc::new(self.registry.build().await?);
        let mut engine = ArbitrationEngine::new(Arc::clone(&registry), self.region);
        if let Some(window) = self.penalty_window {
            engine = engine.penalty_window(window);
        }
        let mut cache = CacheManager::new(self.cache_policy, self.cache_capacity);
        if let Some(l2) = self.l2 {
            cache = cache.with_l2(l2);
        }

        Ok(Faro {
            registry,
            engine: Arc::new(engine),
            cache: Arc::new(cache),
            guardrail: Arc::new(ComplianceGuardrail::with_config(self.guardrail_config)),
            tasks: TaskRegistry::with_default_ttl(),
            narrative: self.narrative,
            region: self.region,
        })
    }
}

/// The application context: registry, arbitration, cache, guardrail and
/// task registry, constructed once at startup and passed to handlers.
pub struct Faro {
    registry: Arc<ProviderRegistry>,
    engine: Arc<ArbitrationEngine>,
    cache: Arc<CacheManager>,
    guardrail: Arc<ComplianceGuardrail>,
    tasks: TaskRegistry,
    narrative: Option<Arc<dyn NarrativeSource>>,
    region: Region,
}

impl Faro {
    /// Start building a context.
    #[must_use]
    pub fn builder() -> FaroBuilder {
        FaroBuilder::new()
    }

    /// The arbitrated read surface (what detectors consume).
    #[must_use]
    pub fn market_reader(&self) -> Arc<dyn MarketReader> {
        Arc::clone(&self.engine) as Arc<dyn MarketReader>
    }

    /// The provider registry.
    #[must_use]
    pub fn registry(&self) -> Arc<ProviderRegistry> {
        Arc::clone(&self.registry)
    }

    /// The cache manager.
    #[must_use]
    pub fn cache_manager(&self) -> Arc<CacheManager> {
        Arc::clone(&self.cache)
    }

    /// The compliance guardrail.
    #[must_use]
    pub fn guardrail(&self) -> Arc<ComplianceGuardrail> {
        Arc::clone(&self.guardrail)
    }

    /// Poll a task handle.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<TaskInfo> {
        self.tasks.get(id)
    }

    /// Wire cache invalidation to a watchdog event stream.
    ///
    /// # Errors
    /// Propagates subscriber-id conflicts from the stream.
    pub fn attach_event_invalidation(&self, stream: &EventStream) -> Result<String, FaroError> {
        self.cache.attach_invalidation(stream)
    }

    /// Shut down every provider.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    async fn cached_fetch(
        &self,
        asset: &Asset,
        kind: DataKind,
        scope: &str,
    ) -> Result<CacheEntry, FaroError> {
        let key = cache_key(kind, &asset.symbol, scope);
        let engine = Arc::clone(&self.engine);
        let fetch_asset = asset.clone();
        let region = self.region;

        self.cache
            .get_with_read_through(&key, kind, asset, move || async move {
                let outcome = engine.fetch(&fetch_asset, kind, region).await?;
                if !outcome.response.is_valid {
                    return Err(FaroError::provider(
                        "arbitration",
                        outcome
                            .response
                            .data
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or("all providers failed")
                            .to_string(),
                    ));
                }
                let mut value = outcome.response.data.clone();
                value.insert(
                    "_lineage".into(),
                    serde_json::to_value(&outcome.lineage)
                        .map_err(|e| FaroError::Data(e.to_string()))?,
                );
                Ok(Fetched {
                    value: Value::Object(value),
                    source: Some(outcome.response.provider.clone()),
                    confidence: Some(outcome.response.confidence),
                })
            })
            .await
    }

    fn quote_from_entry(entry: &CacheEntry) -> (CachedQuote, DataLineage, Map<String, Value>) {
        let map = entry.value.as_object().cloned().unwrap_or_default();
        let number = |key: &str| map.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let source = entry
            .source_provider
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        let lineage = map
            .get("_lineage")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_else(|| DataLineage::single(source.clone(), 0.0));

        let quote = CachedQuote {
            price: number("price"),
            change: number("change"),
            change_percent: number("change_percent"),
            as_of: entry.created_at,
            source,
            ttl: entry.remaining_ttl(Utc::now()).as_secs(),
            confidence: entry.confidence.unwrap_or(0.0),
        };
        (quote, lineage, map)
    }

    async fn structural_for(&self, asset: &Asset) -> Option<StructuralData> {
        match self.cached_fetch(asset, DataKind::Fundamentals, "any").await {
            Ok(entry) => {
                let map = entry.value.as_object()?;
                let number = |key: &str| map.get(key).and_then(Value::as_f64);
                let string = |key: &str| map.get(key).and_then(Value::as_str).map(String::from);
                Some(StructuralData {
                    market_cap: number("market_cap"),
                    pe_ratio: number("pe_ratio"),
                    beta: number("beta"),
                    avg_volume: number("avg_volume"),
                    week_52_high: number("week_52_high"),
                    week_52_low: number("week_52_low"),
                    sector: string("sector"),
                    industry: string("industry"),
                })
            }
            Err(e) => {
                warn!(
                    target = "faro::gateway",
                    symbol = %asset.symbol,
                    error = %e,
                    "failed to fetch fundamentals"
                );
                None
            }
        }
    }

    async fn crypto_metrics_for(&self, asset: &Asset) -> Option<CryptoMetrics> {
        match self.cached_fetch(asset, DataKind::Fundamentals, "any").await {
            Ok(entry) => {
                let map = entry.value.as_object()?;
                let number = |key: &str| map.get(key).and_then(Value::as_f64);
                Some(CryptoMetrics {
                    market_cap_usd: number("market_cap"),
                    volume_24h_usd: number("volume_24h_usd"),
                    change_24h_percent: number("change_24h_percent"),
                    circulating_supply: number("circulating_supply"),
                    funding_rate: number("funding_rate"),
                })
            }
            Err(e) => {
                warn!(
                    target = "faro::gateway",
                    symbol = %asset.symbol,
                    error = %e,
                    "failed to fetch crypto metrics"
                );
                None
            }
        }
    }

    /// Run text through the guardrail off the async scheduler.
    async fn guard(
        &self,
        text: String,
        asset_kind: AssetKind,
        language: Language,
    ) -> Option<faro_guardrail::GuardrailResult> {
        let guardrail = Arc::clone(&self.guardrail);
        let region = self.region;
        match tokio::task::spawn_blocking(move || {
            guardrail.process(&text, asset_kind, region, language)
        })
        .await
        {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(target = "faro::gateway", error = %e, "guardrail task failed");
                None
            }
        }
    }

    async fn narrative_for(
        &self,
        asset: &Asset,
        context: &Map<String, Value>,
        language: &str,
        expertise: ExpertiseLevel,
    ) -> Option<String> {
        let source = self.narrative.as_ref()?;
        let key = narrative_key(&asset.symbol, language, expertise.as_str());

        if let Some(entry) = self.cache.get(&key).await {
            return entry.value.as_str().map(String::from);
        }

        let raw = match source.summarize(asset, context, language, expertise).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    target = "faro::gateway",
                    symbol = %asset.symbol,
                    error = %e,
                    "narrative generation failed"
                );
                return None;
            }
        };

        let result = self
            .guard(raw, asset.kind, Language::from_code(language))
            .await?;
        if !result.is_compliant() {
            warn!(
                target = "faro::gateway",
                symbol = %asset.symbol,
                violations = result.violations_found.len(),
                "narrative blocked by guardrail"
            );
            return None;
        }

        let volatility = context
            .get("change_24h_percent")
            .or_else(|| context.get("change_percent"))
            .and_then(Value::as_f64);
        let ttl = ttl::narrative_ttl(self.cache.policy(), volatility, Utc::now());
        let processed = result.processed_text;
        self.cache
            .set(
                &key,
                CacheEntry::with_ttl(Value::String(processed.clone()), ttl),
            )
            .await;
        Some(processed)
    }

    /// Equity lookup: instantly-served cached price, depth-gated structural
    /// data, a pollable analysis task, lineage and a regional disclaimer.
    ///
    /// Failures come back as a well-formed report with `source == "error"`;
    /// no error escapes to the transport layer.
    pub async fn search_by_symbol(&self, query: SymbolQuery) -> SymbolReport {
        info!(
            target = "faro::gateway",
            symbol = %query.symbol,
            depth = ?query.depth,
            "search_by_symbol"
        );
        let disclaimer = self
            .guardrail
            .disclaimers()
            .generate(AssetKind::Equity, self.region, true);

        let asset = match Asset::new(&query.symbol, AssetKind::Equity) {
            Ok(asset) => asset.with_market(query.market.clone()),
            Err(e) => {
                return SymbolReport {
                    symbol: query.symbol.trim().to_ascii_uppercase(),
                    market: query.market,
                    currency: "USD".into(),
                    cached: CachedQuote::error(),
                    structural_data: None,
                    task: TaskInfo::failed("equity_analysis"),
                    data_lineage: DataLineage::default(),
                    disclaimer: format!("Invalid request: {e}.\n\n{disclaimer}"),
                    narrative_summary: None,
                };
            }
        };

        let entry = self.cached_fetch(&asset, DataKind::Price, "any").await;
        let (cached, lineage, context) = match &entry {
            Ok(entry) => Self::quote_from_entry(entry),
            Err(e) => {
                warn!(
                    target = "faro::gateway",
                    symbol = %asset.symbol,
                    error = %e,
                    "price fetch failed"
                );
                (CachedQuote::error(), DataLineage::default(), Map::new())
            }
        };

        let structural_data = if entry.is_ok()
            && matches!(query.depth, AnalysisDepth::Standard | AnalysisDepth::Deep)
        {
            self.structural_for(&asset).await
        } else {
            None
        };

        let task = if entry.is_ok() {
            let eta = if query.depth == AnalysisDepth::Deep { 30 } else { 5 };
            let task = TaskInfo::pending(
                TaskRegistry::new_task_id(&asset.symbol),
                "equity_analysis",
                eta,
            );
            self.tasks.register(task.clone());
            task
        } else {
            TaskInfo::failed("equity_analysis")
        };

        let narrative_summary = if entry.is_ok()
            && query.include_narrative
            && query.depth != AnalysisDepth::Quick
        {
            self.narrative_for(&asset, &context, &query.language, query.expertise)
                .await
        } else {
            None
        };

        SymbolReport {
            symbol: asset.symbol.clone(),
            market: query.market,
            currency: context
                .get("currency")
                .and_then(Value::as_str)
                .unwrap_or("USD")
                .to_string(),
            cached,
            structural_data,
            task,
            data_lineage: lineage,
            disclaimer,
            narrative_summary,
        }
    }

    /// Crypto lookup: same shape as [`search_by_symbol`](Self::search_by_symbol)
    /// with crypto market metrics instead of structural data.
    pub async fn search_by_coin(&self, query: CoinQuery) -> CoinReport {
        info!(
            target = "faro::gateway",
            symbol = %query.symbol,
            exchange = %query.exchange,
            depth = ?query.depth,
            "search_by_coin"
        );
        let disclaimer = self
            .guardrail
            .disclaimers()
            .generate(AssetKind::Crypto, self.region, true);

        let asset = match Asset::new(&query.symbol, AssetKind::Crypto) {
            Ok(asset) if query.exchange.is_empty() => asset,
            Ok(asset) => asset.with_exchange(query.exchange.clone()),
            Err(e) => {
                return CoinReport {
                    symbol: query.symbol.trim().to_ascii_uppercase(),
                    exchange: None,
                    cached: CachedQuote::error(),
                    crypto_metrics: None,
                    task: TaskInfo::failed("crypto_analysis"),
                    data_lineage: DataLineage::default(),
                    disclaimer: format!("Invalid request: {e}.\n\n{disclaimer}"),
                    narrative_summary: None,
                };
            }
        };

        let display_symbol = if query.pair.is_empty() {
            asset.symbol.clone()
        } else {
            asset.pair_for(&query.pair)
        };

        let entry = self.cached_fetch(&asset, DataKind::Price, "any").await;
        let (cached, lineage, context) = match &entry {
            Ok(entry) => Self::quote_from_entry(entry),
            Err(e) => {
                warn!(
                    target = "faro::gateway",
                    symbol = %asset.symbol,
                    error = %e,
                    "price fetch failed"
                );
                (CachedQuote::error(), DataLineage::default(), Map::new())
            }
        };

        let crypto_metrics = if entry.is_ok()
            && matches!(query.depth, AnalysisDepth::Standard | AnalysisDepth::Deep)
        {
            self.crypto_metrics_for(&asset).await
        } else {
            None
        };

        let task = if entry.is_ok() {
            let eta = if query.depth == AnalysisDepth::Deep { 30 } else { 5 };
            let task = TaskInfo::pending(
                TaskRegistry::new_task_id(&asset.symbol),
                "crypto_analysis",
                eta,
            );
            self.tasks.register(task.clone());
            task
        } else {
            TaskInfo::failed("crypto_analysis")
        };

        let narrative_summary = if entry.is_ok()
            && query.include_narrative
            && query.depth != AnalysisDepth::Quick
        {
            self.narrative_for(&asset, &context, &query.language, query.expertise)
                .await
        } else {
            None
        };

        CoinReport {
            symbol: display_symbol,
            exchange: asset.exchange.clone(),
            cached,
            crypto_metrics,
            task,
            data_lineage: lineage,
            disclaimer,
            narrative_summary,
        }
    }
}
