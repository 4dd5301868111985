//! Faro-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod alerts;
mod asset;
mod cache;
mod events;
mod provider;
mod region;
mod reports;
mod score;
mod watchdog;

pub use alerts::{
    AlertConfig, AlertTrigger, DeliveryMethod, EmailConfig, TelegramConfig, WebhookConfig,
};
pub use asset::{Asset, AssetError, AssetKind};
pub use cache::{CacheEntry, CachePolicy};
pub use events::{EventFilter, EventType, Severity, WatchdogEvent};
pub use provider::{DataKind, ProviderConfig, ProviderHealth, ProviderKey};
pub use region::Region;
pub use reports::{
    AnalysisDepth, CachedQuote, CoinReport, CryptoMetrics, ExpertiseLevel, StructuralData,
    SymbolReport, TaskInfo, TaskStatus,
};
pub use score::{DataLineage, ProviderScore, ScorePolicy, ScoreWeights};
pub use watchdog::{WatchdogConfig, WatchdogHealth, WatchdogStatus};
