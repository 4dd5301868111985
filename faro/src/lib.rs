//! faro
//!
//! Multi-source financial-data arbitration and intelligence gateway.
//!
//! The orchestrator crate wires the workspace together: a [`ProviderRegistry`]
//! built once from configuration, an [`ArbitrationEngine`] that scores and
//! routes each request with serial fallback, a tiered [`CacheManager`] with
//! volatility-aware TTLs and event-driven invalidation, and the [`Faro`]
//! gateway surface producing compliant, lineage-stamped reports.
#![warn(missing_docs)]

/// Provider scoring, plans and fallback execution.
pub mod arbitration;
/// Cache tiers, read-through manager and key helpers.
pub mod cache;
/// The gateway context and request surface.
pub mod gateway;
/// Provider registry construction and enumeration.
pub mod registry;
/// Environment-driven settings.
pub mod settings;
/// Pollable deep-analysis task handles.
pub mod tasks;
/// TTL policy.
pub mod ttl;

pub use arbitration::{ArbitrationEngine, ArbitrationOutcome, ArbitrationPlan};
pub use cache::{CacheManager, CacheTier, Fetched, MemoryTier, cache_key, narrative_key};
pub use gateway::{CoinQuery, Faro, FaroBuilder, SymbolQuery};
pub use registry::{ProviderFactories, ProviderFactory, ProviderRegistry, RegistryBuilder};
pub use settings::Settings;
pub use tasks::TaskRegistry;
pub use ttl::{is_us_market_hours, narrative_ttl, ttl_policy};
