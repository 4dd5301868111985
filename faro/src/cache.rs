//! Tiered key/value cache with read-through, single-flight and event-driven
//! invalidation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use faro_core::FaroError;
use faro_types::{Asset, CacheEntry, CachePolicy, DataKind, EventType, Severity, WatchdogEvent};
use faro_watchdog::EventStream;
use moka::Expiry;
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ttl;

/// Uniform contract over cache tiers (L1 in-process, L2 durable/networked).
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Read a live entry; expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, FaroError>;

    /// Store an entry under its own expiry.
    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), FaroError>;

    /// Drop one key.
    async fn delete(&self, key: &str) -> Result<(), FaroError>;

    /// Drop every key matching a `*` glob (e.g. `"price:AAPL:*"`).
    async fn delete_pattern(&self, pattern: &str) -> Result<(), FaroError>;
}

/// Structured cache key: `"{kind}:{SYMBOL}:{scope}"`.
#[must_use]
pub fn cache_key(kind: DataKind, symbol: &str, scope: &str) -> String {
    format!("{}:{}:{}", kind.as_str(), symbol, scope)
}

/// Narrative cache key: `"narrative:{SYMBOL}:{lang}:{level}"`.
#[must_use]
pub fn narrative_key(symbol: &str, language: &str, expertise: &str) -> String {
    format!("narrative:{symbol}:{language}:{expertise}")
}

/// Simple `*` glob matcher used by pattern invalidation.
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut segments = pattern.split('*').peekable();
    let mut rest = key;
    let mut first = true;

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            first = false;
            continue;
        }
        if first {
            // Anchored prefix.
            let Some(stripped) = rest.strip_prefix(segment) else {
                return false;
            };
            rest = stripped;
        } else if segments.peek().is_none() && !pattern.ends_with('*') {
            // Anchored suffix.
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        first = false;
    }
    pattern.ends_with('*') || rest.is_empty()
}

struct EntryExpiry;

impl Expiry<String, Arc<CacheEntry>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Arc<CacheEntry>,
        _created_at: std::time::Instant,
    ) -> Option<std::time::Duration> {
        Some(entry.remaining_ttl(Utc::now()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Arc<CacheEntry>,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<std::time::Duration>,
    ) -> Option<std::time::Duration> {
        Some(entry.remaining_ttl(Utc::now()))
    }
}

/// In-process tier with per-entry TTL and predicate invalidation.
pub struct MemoryTier {
    cache: Cache<String, Arc<CacheEntry>>,
}

impl MemoryTier {
    /// Tier bounded at `capacity` entries.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity.max(1))
            .expire_after(EntryExpiry)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Single-flight read: concurrent callers for a missing key coalesce
    /// into one `init` run; late arrivals receive the same result, and a
    /// failed `init` caches nothing.
    pub async fn get_or_try_insert_with<F>(
        &self,
        key: String,
        init: F,
    ) -> Result<Arc<CacheEntry>, FaroError>
    where
        F: Future<Output = Result<Arc<CacheEntry>, FaroError>>,
    {
        self.cache
            .try_get_with(key, init)
            .await
            .map_err(|err: Arc<FaroError>| (*err).clone())
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, FaroError> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired(Utc::now()) => {
                self.cache.invalidate(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some((*entry).clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), FaroError> {
        self.cache.insert(key.to_string(), Arc::new(entry)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), FaroError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<(), FaroError> {
        let pattern = pattern.to_string();
        self.cache
            .invalidate_entries_if(move |key, _| glob_match(&pattern, key))
            .map_err(|e| FaroError::Cache(e.to_string()))?;
        Ok(())
    }
}

/// What the read-through fetch produced, before caching.
pub struct Fetched {
    /// Payload to cache.
    pub value: Value,
    /// Serving provider.
    pub source: Option<String>,
    /// Serving provider's confidence.
    pub confidence: Option<f64>,
}

/// Read-through cache manager over an L1 memory tier and an optional L2.
pub struct CacheManager {
    l1: MemoryTier,
    l2: Option<Arc<dyn CacheTier>>,
    policy: CachePolicy,
}

impl CacheManager {
    /// Manager with an L1 of `capacity` entries and no L2.
    #[must_use]
    pub fn new(policy: CachePolicy, capacity: u64) -> Self {
        Self {
            l1: MemoryTier::new(capacity),
            l2: None,
            policy,
        }
    }

    /// Attach a durable second tier.
    #[must_use]
    pub fn with_l2(mut self, l2: Arc<dyn CacheTier>) -> Self {
        self.l2 = Some(l2);
        self
    }

    /// The TTL policy knobs in force.
    #[must_use]
    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Plain read: L1, then L2. Tier failures degrade to a miss.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.l1.get(key).await {
            Ok(Some(entry)) => return Some(entry),
            Ok(None) => {}
            Err(e) => warn!(target = "faro::cache", key, error = %e, "L1 read failed"),
        }
        if let Some(l2) = &self.l2 {
            match l2.get(key).await {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(e) => warn!(target = "faro::cache", key, error = %e, "L2 read failed"),
            }
        }
        None
    }

    /// Direct write to both tiers.
    pub async fn set(&self, key: &str, entry: CacheEntry) {
        if let Err(e) = self.l1.set(key, entry.clone()).await {
            warn!(target = "faro::cache", key, error = %e, "L1 write failed");
        }
        if let Some(l2) = &self.l2
            && let Err(e) = l2.set(key, entry).await
        {
            warn!(target = "faro::cache", key, error = %e, "L2 write failed");
        }
    }

    /// Read-through fetch with single-flight coalescing.
    ///
    /// 1. L1 hit wins.
    /// 2. L2 hit is written behind into L1 with a short TTL.
    /// 3. Otherwise exactly one caller runs `fetch`; its value is cached in
    ///    both tiers under `ttl_policy(kind, asset, volatility)`.
    /// 4. Fetch failures propagate and poison nothing.
    pub async fn get_with_read_through<F, Fut>(
        &self,
        key: &str,
        kind: DataKind,
        asset: &Asset,
        fetch: F,
    ) -> Result<CacheEntry, FaroError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Fetched, FaroError>> + Send,
    {
        let l2 = self.l2.clone();
        let policy = self.policy.clone();
        let asset = asset.clone();
        let key_owned = key.to_string();

        let init = async move {
            // L2 probe before paying for a fetch.
            if let Some(l2) = &l2 {
                match l2.get(&key_owned).await {
                    Ok(Some(mut entry)) => {
                        debug!(target = "faro::cache", key = %key_owned, "L2 hit, writing behind");
                        let write_behind = Utc::now()
                            + chrono::Duration::seconds(policy.l1_write_behind_secs as i64);
                        entry.expires_at = entry.expires_at.min(write_behind);
                        return Ok(Arc::new(entry));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(target = "faro::cache", key = %key_owned, error = %e, "L2 read failed, fetching directly");
                    }
                }
            }

            let fetched = fetch().await?;
            let volatility = volatility_of(&fetched.value, asset.kind);
            let ttl = ttl::ttl_policy(&policy, kind, &asset, volatility, Utc::now());
            let mut entry = CacheEntry::with_ttl(fetched.value, ttl);
            entry.source_provider = fetched.source;
            entry.confidence = fetched.confidence;

            if let Some(l2) = &l2
                && let Err(e) = l2.set(&key_owned, entry.clone()).await
            {
                warn!(target = "faro::cache", key = %key_owned, error = %e, "L2 write failed");
            }
            debug!(
                target = "faro::cache",
                key = %key_owned,
                ttl_s = ttl.as_secs(),
                "cache miss, stored fresh value"
            );
            Ok(Arc::new(entry))
        };

        let entry = self.l1.get_or_try_insert_with(key.to_string(), init).await?;
        Ok((*entry).clone())
    }

    /// Delete `"{kind}:{SYMBOL}:*"` across both tiers for every data kind.
    pub async fn invalidate_symbol(&self, symbol: &str) {
        for kind in DataKind::all() {
            let pattern = format!("{}:{}:*", kind.as_str(), symbol);
            if let Err(e) = self.l1.delete_pattern(&pattern).await {
                warn!(target = "faro::cache", pattern = %pattern, error = %e, "L1 invalidation failed");
            }
            if let Some(l2) = &self.l2
                && let Err(e) = l2.delete_pattern(&pattern).await
            {
                warn!(target = "faro::cache", pattern = %pattern, error = %e, "L2 invalidation failed");
            }
        }
        info!(target = "faro::cache", symbol, "invalidated cached entries for symbol");
    }

    /// Whether an event is significant enough to invalidate cached values
    /// for its symbol.
    fn event_invalidates(event: &WatchdogEvent) -> bool {
        if matches!(event.severity, Severity::High | Severity::Critical) {
            return true;
        }
        match event.event_type {
            EventType::PriceAnomaly | EventType::FlashCrash => event
                .data
                .get("change_pct")
                .and_then(Value::as_f64)
                .is_some_and(|change| change.abs() > 3.0),
            EventType::EarningsAnomaly => true,
            _ => false,
        }
    }

    /// Subscribe this manager to an event stream so significant events evict
    /// the affected symbol's entries. The callback only schedules work; the
    /// deletions run on a spawned task.
    pub fn attach_invalidation(
        self: &Arc<Self>,
        stream: &EventStream,
    ) -> Result<String, FaroError> {
        let manager = Arc::clone(self);
        let handle = tokio::runtime::Handle::current();
        stream.subscribe(
            Arc::new(move |event: &WatchdogEvent| {
                if !Self::event_invalidates(event) {
                    return;
                }
                let Some(symbol) = event.symbol().map(String::from) else {
                    return;
                };
                let manager = Arc::clone(&manager);
                handle.spawn(async move {
                    manager.invalidate_symbol(&symbol).await;
                });
            }),
            None,
            Some("cache_invalidation".to_string()),
        )
    }
}

fn volatility_of(value: &Value, kind: faro_types::AssetKind) -> Option<f64> {
    let map = value.as_object()?;
    let field = if kind == faro_types::AssetKind::Crypto {
        map.get("change_24h_percent").or_else(|| map.get("change_percent"))
    } else {
        map.get("change_percent")
    };
    field.and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matching() {
        assert!(glob_match("price:AAPL:*", "price:AAPL:any"));
        assert!(glob_match("price:AAPL:*", "price:AAPL:"));
        assert!(!glob_match("price:AAPL:*", "price:TSLA:any"));
        assert!(!glob_match("price:AAPL:*", "ohlcv:AAPL:any"));
        assert!(glob_match("*:AAPL:any", "price:AAPL:any"));
        assert!(glob_match("price:*:any", "price:AAPL:any"));
        assert!(glob_match("price:AAPL:any", "price:AAPL:any"));
        assert!(!glob_match("price:AAPL:any", "price:AAPL:other"));
    }
}
