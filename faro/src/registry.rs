//! Construction and enumeration of the provider set.
//!
//! Providers are built once at startup from configuration through a factory
//! table (no reflection), wrapped in the middleware stack, initialized in
//! parallel, and registered only when initialization succeeds. After that the
//! registry is read-only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use faro_core::provider::Provider;
use faro_core::FaroError;
use faro_middleware::ProviderBuilder;
use faro_types::{Asset, DataKind, ProviderConfig, ProviderHealth};
use futures::future::join_all;
use tracing::{info, warn};

/// Constructor for one provider kind; returns `None` when required
/// credentials are absent (which silently disables the provider).
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderConfig) -> Option<Arc<dyn Provider>> + Send + Sync>;

/// Factory table keyed by provider name.
#[derive(Default, Clone)]
pub struct ProviderFactories {
    map: HashMap<String, ProviderFactory>,
}

impl ProviderFactories {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a provider name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderConfig) -> Option<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        self.map.insert(name.into(), Arc::new(factory));
    }

    fn get(&self, name: &str) -> Option<&ProviderFactory> {
        self.map.get(name)
    }
}

/// Builder that assembles and initializes the registry.
pub struct RegistryBuilder {
    factories: ProviderFactories,
    configs: Vec<ProviderConfig>,
    direct: Vec<(ProviderConfig, Arc<dyn Provider>)>,
    backoff: Duration,
}

impl RegistryBuilder {
    /// Empty builder with the default 5-minute backoff gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: ProviderFactories::new(),
            configs: Vec::new(),
            direct: Vec::new(),
            backoff: Duration::from_secs(300),
        }
    }

    /// Use `factories` to construct the named `configs`.
    #[must_use]
    pub fn with_factories(mut self, factories: ProviderFactories, configs: Vec<ProviderConfig>) -> Self {
        self.factories = factories;
        self.configs = configs;
        self
    }

    /// Register an already-constructed provider under a config.
    #[must_use]
    pub fn with_provider(mut self, config: ProviderConfig, provider: Arc<dyn Provider>) -> Self {
        self.direct.push((config, provider));
        self
    }

    /// Override the default backoff-gate duration.
    #[must_use]
    pub const fn backoff_duration(mut self, duration: Duration) -> Self {
        self.backoff = duration;
        self
    }

    fn wrap(&self, config: &ProviderConfig, raw: Arc<dyn Provider>) -> Arc<dyn Provider> {
        ProviderBuilder::new(raw)
            .with_rate_limit(config.rate_limit_per_minute, Duration::from_secs(60))
            .with_backoff(self.backoff)
            .build()
    }

    /// Construct, wrap and initialize every provider, keeping the successes.
    ///
    /// Initialization runs in parallel; a provider that fails to initialize
    /// is skipped and logged, never registered.
    ///
    /// # Errors
    /// `Config` when no provider at all could be registered.
    pub async fn build(mut self) -> Result<ProviderRegistry, FaroError> {
        let mut candidates: Vec<(ProviderConfig, Arc<dyn Provider>)> = Vec::new();

        for config in &self.configs {
            match self.factories.get(&config.name) {
                Some(factory) => match factory(config) {
                    Some(raw) => candidates.push((config.clone(), self.wrap(config, raw))),
                    None => info!(
                        target = "faro::registry",
                        provider = %config.name,
                        "provider skipped: missing credentials"
                    ),
                },
                None => warn!(
                    target = "faro::registry",
                    provider = %config.name,
                    "provider skipped: no factory registered"
                ),
            }
        }
        for (config, raw) in std::mem::take(&mut self.direct) {
            let wrapped = self.wrap(&config, raw);
            candidates.push((config, wrapped));
        }

        let initialized = join_all(candidates.into_iter().map(|(config, provider)| async move {
            match provider.initialize().await {
                Ok(()) => {
                    info!(target = "faro::registry", provider = provider.name(), "registered provider");
                    Some((config, provider))
                }
                Err(e) => {
                    warn!(
                        target = "faro::registry",
                        provider = provider.name(),
                        error = %e,
                        "provider failed to initialize, skipping registration"
                    );
                    None
                }
            }
        }))
        .await;

        let mut providers = Vec::new();
        let mut configs = HashMap::new();
        for (config, provider) in initialized.into_iter().flatten() {
            configs.insert(provider.name().to_string(), config);
            providers.push(provider);
        }

        if providers.is_empty() {
            return Err(FaroError::Config(
                "no providers registered; add at least one via with_provider or factories".into(),
            ));
        }

        info!(
            target = "faro::registry",
            count = providers.len(),
            "provider registry initialized"
        );
        Ok(ProviderRegistry { providers, configs })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only registry of initialized providers.
///
/// Provider identity (name) is stable for the process lifetime; the map is
/// populated once at startup and safe to read without locks thereafter.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    configs: HashMap<String, ProviderConfig>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Providers compatible with `(asset, kind)`, ordered by descending
    /// static priority (stable for ties).
    ///
    /// # Errors
    /// `NoProviderAvailable` when nothing matches.
    pub fn get_providers_for(
        &self,
        asset: &Asset,
        kind: DataKind,
    ) -> Result<Vec<Arc<dyn Provider>>, FaroError> {
        let mut matches: Vec<Arc<dyn Provider>> = self
            .providers
            .iter()
            .filter(|p| {
                self.configs
                    .get(p.name())
                    .is_some_and(|c| c.enabled)
                    && p.supports_asset(asset)
                    && p.supports(kind)
            })
            .cloned()
            .collect();

        matches.sort_by_key(|p| std::cmp::Reverse(self.priority_of(p.name())));

        if matches.is_empty() {
            return Err(FaroError::NoProviderAvailable {
                symbol: asset.symbol.clone(),
                kind,
            });
        }
        Ok(matches)
    }

    /// Look up a provider by name.
    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// The configuration a provider was registered under.
    #[must_use]
    pub fn config_for(&self, name: &str) -> Option<&ProviderConfig> {
        self.configs.get(name)
    }

    /// Static priority for a provider; unknown names rank lowest.
    #[must_use]
    pub fn priority_of(&self, name: &str) -> u8 {
        self.configs.get(name).map_or(0, |c| c.priority)
    }

    /// Per-call timeout for a provider.
    #[must_use]
    pub fn timeout_for(&self, name: &str) -> Duration {
        self.configs
            .get(name)
            .map_or(Duration::from_secs(5), ProviderConfig::timeout)
    }

    /// All registered provider names, registration order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Health of every registered provider.
    #[must_use]
    pub fn all_health(&self) -> HashMap<String, ProviderHealth> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.health()))
            .collect()
    }

    /// Shut every provider down in parallel, logging failures.
    pub async fn shutdown(&self) {
        let results = join_all(self.providers.iter().map(|p| async move {
            (p.name(), p.shutdown().await)
        }))
        .await;
        for (name, result) in results {
            match result {
                Ok(()) => info!(target = "faro::registry", provider = name, "provider shut down"),
                Err(e) => warn!(
                    target = "faro::registry",
                    provider = name,
                    error = %e,
                    "error shutting down provider"
                ),
            }
        }
    }
}
