//! Provider scoring, plan construction and serial fallback execution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faro_core::provider::{Provider, Timeframe};
use faro_core::{FaroError, MarketReader, ProviderResponse};
use faro_types::{
    Asset, DataKind, DataLineage, ProviderScore, Region, ScorePolicy,
};
use serde_json::json;
use tracing::{debug, info, warn};

/// Default OHLCV depth fetched when a plan executes a history request.
const OHLCV_LIMIT: usize = 90;

/// Default news depth fetched when a plan executes a news request.
const NEWS_LIMIT: usize = 10;

/// Immutable, ordered provider selection for one request.
pub struct ArbitrationPlan {
    /// Best-scoring provider, attempted first.
    pub primary: Arc<dyn Provider>,
    /// Remaining compatible providers in descending score order.
    pub fallbacks: Vec<Arc<dyn Provider>>,
    /// Expected latency of the primary, from its health record.
    pub estimated_latency_ms: f64,
    /// Per-provider timeout applied to the primary.
    pub timeout: Duration,
    /// Score snapshot taken at plan time, best first.
    pub scores: Vec<ProviderScore>,
    /// Asset the plan was computed for.
    pub asset: Asset,
    /// Data kind the plan was computed for.
    pub kind: DataKind,
    /// Caller region; regional restrictions observed during execution are
    /// recorded against it.
    pub region: Region,
}

impl ArbitrationPlan {
    /// Name of the primary provider.
    #[must_use]
    pub fn primary_name(&self) -> &'static str {
        self.primary.name()
    }

    fn score_of(&self, name: &str) -> f64 {
        self.scores
            .iter()
            .find(|s| s.provider == name)
            .map_or(0.0, |s| s.total)
    }
}

/// Outcome of executing a plan: the served response plus its lineage.
pub struct ArbitrationOutcome {
    /// Served response; the `is_valid == false` sentinel when every provider
    /// failed.
    pub response: ProviderResponse,
    /// Audit record of the attempt.
    pub lineage: DataLineage,
}

/// Scores providers per request and executes plans with serial fallback.
pub struct ArbitrationEngine {
    registry: Arc<crate::registry::ProviderRegistry>,
    policy: ScorePolicy,
    coverage: HashMap<(String, DataKind), f64>,
    penalties: Mutex<HashMap<(String, Region), Instant>>,
    penalty_window: Duration,
    default_region: Region,
}

impl ArbitrationEngine {
    /// Engine over `registry` with the default scoring policy and a
    /// 30-minute regional penalty window.
    #[must_use]
    pub fn new(registry: Arc<crate::registry::ProviderRegistry>, default_region: Region) -> Self {
        Self {
            registry,
            policy: ScorePolicy::default(),
            coverage: HashMap::new(),
            penalties: Mutex::new(HashMap::new()),
            penalty_window: Duration::from_secs(1_800),
            default_region,
        }
    }

    /// Override the regional penalty window.
    #[must_use]
    pub const fn penalty_window(mut self, window: Duration) -> Self {
        self.penalty_window = window;
        self
    }

    /// Configure field coverage for a `(provider, kind)` pair, `[0, 100]`.
    #[must_use]
    pub fn with_coverage(mut self, provider: impl Into<String>, kind: DataKind, score: f64) -> Self {
        self.coverage.insert((provider.into(), kind), score.clamp(0.0, 100.0));
        self
    }

    fn coverage_of(&self, provider: &str, kind: DataKind) -> f64 {
        self.coverage
            .get(&(provider.to_string(), kind))
            .copied()
            .unwrap_or(70.0)
    }

    fn is_penalized(&self, provider: &str, region: Region) -> bool {
        let mut penalties = self.penalties.lock().expect("penalty mutex poisoned");
        let key = (provider.to_string(), region);
        match penalties.get(&key) {
            Some(at) if at.elapsed() < self.penalty_window => true,
            Some(_) => {
                penalties.remove(&key);
                false
            }
            None => false,
        }
    }

    fn record_region_penalty(&self, provider: &str, region: Region) {
        warn!(
            target = "faro::arbitration",
            provider,
            region = %region,
            "recording regional restriction penalty"
        );
        self.penalties
            .lock()
            .expect("penalty mutex poisoned")
            .insert((provider.to_string(), region), Instant::now());
    }

    fn score(&self, provider: &Arc<dyn Provider>, kind: DataKind, now: DateTime<Utc>) -> ProviderScore {
        let health = provider.health();
        let weights = self.policy.weights_for(kind);

        let freshness = freshness_score(provider.last_request(), kind, now);
        let latency = (100.0 - health.avg_latency_ms / 10.0).clamp(0.0, 100.0);
        let uptime = health.uptime_percent.clamp(0.0, 100.0);
        let completeness = self.coverage_of(provider.name(), kind);
        let reliability = (health.success_rate * 100.0).clamp(0.0, 100.0);

        let total = (weights.freshness * freshness
            + weights.latency * latency
            + weights.uptime * uptime
            + weights.completeness * completeness
            + weights.reliability * reliability)
            / 100.0;

        ProviderScore {
            provider: provider.name().to_string(),
            freshness,
            latency,
            uptime,
            completeness,
            reliability,
            total,
        }
    }

    /// Compute a plan for `(asset, kind, region)`.
    ///
    /// The primary maximizes the weighted score; ties break on static
    /// priority, then registration order. Providers with a live regional
    /// penalty for `region` are excluded from candidacy.
    ///
    /// # Errors
    /// `NoProviderAvailable` when no compatible, unpenalized provider exists.
    pub fn arbitrate(
        &self,
        asset: &Asset,
        kind: DataKind,
        region: Region,
    ) -> Result<ArbitrationPlan, FaroError> {
        let candidates = self.registry.get_providers_for(asset, kind)?;
        let now = Utc::now();

        let mut scored: Vec<(Arc<dyn Provider>, ProviderScore)> = candidates
            .into_iter()
            .filter(|p| !self.is_penalized(p.name(), region))
            .map(|p| {
                let score = self.score(&p, kind, now);
                (p, score)
            })
            .collect();

        if scored.is_empty() {
            return Err(FaroError::NoProviderAvailable {
                symbol: asset.symbol.clone(),
                kind,
            });
        }

        scored.sort_by(|(a, sa), (b, sb)| {
            sb.total
                .partial_cmp(&sa.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    self.registry
                        .priority_of(b.name())
                        .cmp(&self.registry.priority_of(a.name()))
                })
        });

        let scores: Vec<ProviderScore> = scored.iter().map(|(_, s)| s.clone()).collect();
        let mut providers: Vec<Arc<dyn Provider>> = scored.into_iter().map(|(p, _)| p).collect();
        let primary = providers.remove(0);

        debug!(
            target = "faro::arbitration",
            symbol = %asset.symbol,
            kind = %kind,
            primary = primary.name(),
            fallbacks = providers.len(),
            score = scores[0].total,
            "arbitration plan computed"
        );

        Ok(ArbitrationPlan {
            estimated_latency_ms: primary.health().avg_latency_ms,
            timeout: self.registry.timeout_for(primary.name()),
            primary,
            fallbacks: providers,
            scores,
            asset: asset.clone(),
            kind,
            region,
        })
    }

    async fn call_provider(
        provider: &Arc<dyn Provider>,
        asset: &Asset,
        kind: DataKind,
    ) -> Result<ProviderResponse, FaroError> {
        match kind {
            DataKind::Price => {
                let p = provider
                    .as_price_provider()
                    .ok_or_else(|| FaroError::not_supported(provider.name(), kind))?;
                p.fetch_price(asset).await
            }
            DataKind::Ohlcv | DataKind::Technical => {
                let p = provider
                    .as_ohlcv_provider()
                    .ok_or_else(|| FaroError::not_supported(provider.name(), kind))?;
                p.fetch_ohlcv(asset, Timeframe::D1, OHLCV_LIMIT).await
            }
            DataKind::Fundamentals => {
                let p = provider
                    .as_fundamentals_provider()
                    .ok_or_else(|| FaroError::not_supported(provider.name(), kind))?;
                p.fetch_fundamentals(asset).await
            }
            DataKind::News => {
                let p = provider
                    .as_news_provider()
                    .ok_or_else(|| FaroError::not_supported(provider.name(), kind))?;
                p.fetch_news(asset, NEWS_LIMIT).await
            }
            _ => Err(FaroError::not_supported(provider.name(), kind)),
        }
    }

    async fn call_with_timeout(
        provider: &Arc<dyn Provider>,
        asset: &Asset,
        kind: DataKind,
        timeout: Duration,
    ) -> Result<ProviderResponse, FaroError> {
        (tokio::time::timeout(timeout, Self::call_provider(provider, asset, kind)).await)
            .unwrap_or_else(|_| Err(FaroError::provider_timeout(provider.name(), kind)))
    }

    /// Execute a plan with strict serial fallback.
    ///
    /// The first `is_valid` response wins and is annotated with its
    /// provider's score; regional restrictions mark the provider for the
    /// plan's region before advancing. When every provider fails, the
    /// sentinel error response is returned rather than an error.
    pub async fn execute_with_fallback(&self, plan: &ArbitrationPlan) -> ArbitrationOutcome {
        let mut consulted: Vec<String> = Vec::new();
        let mut failures: Vec<FaroError> = Vec::new();

        let attempts = std::iter::once(&plan.primary).chain(plan.fallbacks.iter());
        for provider in attempts {
            let name = provider.name();
            consulted.push(name.to_string());
            let timeout = self.registry.timeout_for(name);

            match Self::call_with_timeout(provider, &plan.asset, plan.kind, timeout).await {
                Ok(response) if response.is_valid => {
                    let score = plan.score_of(name);
                    let mut response = response;
                    response
                        .metadata
                        .insert("arbitration_score".into(), json!(score));
                    info!(
                        target = "faro::arbitration",
                        symbol = %plan.asset.symbol,
                        kind = %plan.kind,
                        provider = name,
                        attempts = consulted.len(),
                        "request served"
                    );
                    return ArbitrationOutcome {
                        response,
                        lineage: DataLineage {
                            providers_consulted: consulted,
                            arbitration_score: score,
                            conflict_resolved: false,
                            source_count: 1,
                        },
                    };
                }
                Ok(stale) => {
                    warn!(
                        target = "faro::arbitration",
                        provider = name,
                        "provider returned an invalid payload, advancing"
                    );
                    failures.push(FaroError::Data(format!(
                        "{name} returned invalid payload for {}",
                        stale.asset.symbol
                    )));
                }
                Err(FaroError::RegionRestricted { provider, .. }) => {
                    self.record_region_penalty(&provider, plan.region);
                    failures.push(FaroError::region_restricted(provider, plan.region));
                }
                Err(e) => {
                    warn!(
                        target = "faro::arbitration",
                        provider = name,
                        error = %e,
                        "provider attempt failed, advancing"
                    );
                    failures.push(e);
                }
            }
        }

        warn!(
            target = "faro::arbitration",
            symbol = %plan.asset.symbol,
            kind = %plan.kind,
            attempts = consulted.len(),
            "all providers failed"
        );
        ArbitrationOutcome {
            response: ProviderResponse::error_response(
                plan.asset.clone(),
                plan.kind,
                FaroError::AllProvidersFailed(failures).to_string(),
            ),
            lineage: DataLineage::failed(consulted),
        }
    }

    /// Convenience: plan and execute in one call.
    pub async fn fetch(
        &self,
        asset: &Asset,
        kind: DataKind,
        region: Region,
    ) -> Result<ArbitrationOutcome, FaroError> {
        let plan = self.arbitrate(asset, kind, region)?;
        Ok(self.execute_with_fallback(&plan).await)
    }

    /// The region used when callers do not specify one.
    #[must_use]
    pub const fn default_region(&self) -> Region {
        self.default_region
    }
}

fn freshness_score(last_request: Option<DateTime<Utc>>, kind: DataKind, now: DateTime<Utc>) -> f64 {
    let horizon_secs: f64 = match kind {
        DataKind::Price => 300.0,
        DataKind::Ohlcv | DataKind::Technical => 900.0,
        DataKind::News => 1_800.0,
        DataKind::Fundamentals => 86_400.0,
        _ => 86_400.0,
    };
    match last_request {
        None => 50.0,
        Some(at) => {
            let age = (now - at).num_seconds().max(0) as f64;
            (100.0 - 100.0 * age / horizon_secs).clamp(0.0, 100.0)
        }
    }
}

/// The engine is the read surface detectors consume: a full plan/execute
/// round per call, degrading to the sentinel when no provider is available.
#[async_trait]
impl MarketReader for ArbitrationEngine {
    async fn latest(&self, asset: &Asset, kind: DataKind) -> Result<ProviderResponse, FaroError> {
        match self.arbitrate(asset, kind, self.default_region) {
            Ok(plan) => Ok(self.execute_with_fallback(&plan).await.response),
            Err(FaroError::NoProviderAvailable { .. }) => Ok(ProviderResponse::error_response(
                asset.clone(),
                kind,
                "no provider available",
            )),
            Err(e) => Err(e),
        }
    }
}
