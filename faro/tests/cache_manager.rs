use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use faro_core::FaroError;
use faro_types::{
    Asset, AssetKind, CacheEntry, CachePolicy, DataKind, EventType, Severity, WatchdogEvent,
};
use faro_watchdog::EventStream;
use faro::cache::{CacheManager, CacheTier, Fetched, MemoryTier, cache_key};
use futures::future::join_all;
use serde_json::json;

fn aapl() -> Asset {
    Asset::new("AAPL", AssetKind::Equity).unwrap()
}

fn manager() -> Arc<CacheManager> {
    Arc::new(CacheManager::new(CachePolicy::default(), 1_000))
}

#[tokio::test]
async fn hit_returns_the_exact_value_last_written() {
    let cache = manager();
    let entry = CacheEntry::with_ttl(json!({"price": 100.0}), Duration::from_secs(60));
    cache.set("price:AAPL:any", entry.clone()).await;

    let read = cache.get("price:AAPL:any").await.unwrap();
    assert_eq!(read.value, entry.value);

    let newer = CacheEntry::with_ttl(json!({"price": 101.5}), Duration::from_secs(60));
    cache.set("price:AAPL:any", newer).await;
    let read = cache.get("price:AAPL:any").await.unwrap();
    assert_eq!(read.value["price"], 101.5);
}

#[tokio::test]
async fn expired_entries_read_as_absent() {
    let cache = manager();
    let entry = CacheEntry::with_ttl(json!({"price": 100.0}), Duration::from_millis(30));
    cache.set("price:AAPL:any", entry).await;
    assert!(cache.get("price:AAPL:any").await.is_some());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(cache.get("price:AAPL:any").await.is_none());
}

#[tokio::test]
async fn concurrent_misses_coalesce_into_one_fetch() {
    let cache = manager();
    let fetches = Arc::new(AtomicUsize::new(0));
    let asset = aapl();
    let key = cache_key(DataKind::Price, "AAPL", "any");

    let reads = (0..16).map(|_| {
        let cache = Arc::clone(&cache);
        let fetches = Arc::clone(&fetches);
        let asset = asset.clone();
        let key = key.clone();
        async move {
            cache
                .get_with_read_through(&key, DataKind::Price, &asset, move || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    // Linger so every reader piles onto the same flight.
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok(Fetched {
                        value: json!({"price": 42.0, "change_percent": 0.2}),
                        source: Some("mock".into()),
                        confidence: Some(0.9),
                    })
                })
                .await
        }
    });

    let results: Vec<Result<CacheEntry, FaroError>> = join_all(reads).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1, "single-flight violated");
    for result in results {
        let entry = result.unwrap();
        assert_eq!(entry.value["price"], 42.0);
        assert_eq!(entry.source_provider.as_deref(), Some("mock"));
    }
}

#[tokio::test]
async fn failed_fetches_poison_nothing() {
    let cache = manager();
    let asset = aapl();
    let key = cache_key(DataKind::Price, "AAPL", "any");

    let failed: Result<CacheEntry, FaroError> = cache
        .get_with_read_through(&key, DataKind::Price, &asset, || async {
            Err(FaroError::provider("mock", "upstream down"))
        })
        .await;
    assert!(failed.is_err());

    // The next caller fetches successfully; nothing negative was cached.
    let entry = cache
        .get_with_read_through(&key, DataKind::Price, &asset, || async {
            Ok(Fetched {
                value: json!({"price": 10.0}),
                source: Some("mock".into()),
                confidence: Some(1.0),
            })
        })
        .await
        .unwrap();
    assert_eq!(entry.value["price"], 10.0);
}

#[tokio::test]
async fn l2_hits_are_written_behind_into_l1() {
    let l2: Arc<dyn CacheTier> = Arc::new(MemoryTier::new(100));
    let cache = Arc::new(CacheManager::new(CachePolicy::default(), 100).with_l2(Arc::clone(&l2)));
    let asset = aapl();
    let key = cache_key(DataKind::Price, "AAPL", "any");

    l2.set(
        &key,
        CacheEntry::with_ttl(json!({"price": 55.0}), Duration::from_secs(600)),
    )
    .await
    .unwrap();

    let fetches = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
        let fetches = Arc::clone(&fetches);
        let entry = cache
            .get_with_read_through(&key, DataKind::Price, &asset, move || async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched {
                    value: json!({"price": 0.0}),
                    source: None,
                    confidence: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(entry.value["price"], 55.0);
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 0, "L2 hit should satisfy the read");
}

#[tokio::test]
async fn fresh_values_are_written_to_both_tiers() {
    let l2: Arc<dyn CacheTier> = Arc::new(MemoryTier::new(100));
    let cache = Arc::new(CacheManager::new(CachePolicy::default(), 100).with_l2(Arc::clone(&l2)));
    let asset = aapl();
    let key = cache_key(DataKind::Price, "AAPL", "any");

    cache
        .get_with_read_through(&key, DataKind::Price, &asset, || async {
            Ok(Fetched {
                value: json!({"price": 77.0}),
                source: Some("fmp".into()),
                confidence: Some(0.95),
            })
        })
        .await
        .unwrap();

    let persisted = l2.get(&key).await.unwrap().expect("L2 copy expected");
    assert_eq!(persisted.value["price"], 77.0);
    assert_eq!(persisted.source_provider.as_deref(), Some("fmp"));
}

#[tokio::test]
async fn invalidate_symbol_clears_every_kind_in_both_tiers() {
    let l2: Arc<dyn CacheTier> = Arc::new(MemoryTier::new(100));
    let cache = Arc::new(CacheManager::new(CachePolicy::default(), 100).with_l2(Arc::clone(&l2)));

    for key in ["price:AAPL:any", "ohlcv:AAPL:any", "fundamentals:AAPL:any"] {
        let entry = CacheEntry::with_ttl(json!(1), Duration::from_secs(600));
        cache.set(key, entry).await;
    }
    let survivor = CacheEntry::with_ttl(json!(1), Duration::from_secs(600));
    cache.set("price:TSLA:any", survivor).await;

    cache.invalidate_symbol("AAPL").await;

    assert!(cache.get("price:AAPL:any").await.is_none());
    assert!(cache.get("ohlcv:AAPL:any").await.is_none());
    assert!(cache.get("fundamentals:AAPL:any").await.is_none());
    assert!(l2.get("price:AAPL:any").await.unwrap().is_none());
    assert!(cache.get("price:TSLA:any").await.is_some());
}

#[tokio::test]
async fn critical_events_evict_the_symbol() {
    let cache = manager();
    let stream = EventStream::new(10);
    cache.attach_invalidation(&stream).unwrap();

    let entry = CacheEntry::with_ttl(json!({"price": 189.0}), Duration::from_secs(600));
    cache.set("price:AAPL:any", entry).await;
    assert!(cache.get("price:AAPL:any").await.is_some());

    let mut event = WatchdogEvent::new(
        EventType::PriceAnomaly,
        Severity::Critical,
        Some(aapl()),
        "AAPL moved 8% in a minute",
    )
    .with_data("change_pct", json!(8.2));
    event.watchdog = "price_anomaly".into();
    stream.emit(event).await;

    // Invalidation runs on a spawned task.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        cache.get("price:AAPL:any").await.is_none(),
        "critical event must invalidate the symbol"
    );
}

#[tokio::test]
async fn quiet_events_leave_the_cache_alone() {
    let cache = manager();
    let stream = EventStream::new(10);
    cache.attach_invalidation(&stream).unwrap();

    let entry = CacheEntry::with_ttl(json!({"price": 189.0}), Duration::from_secs(600));
    cache.set("price:AAPL:any", entry).await;

    let mut event = WatchdogEvent::new(
        EventType::PriceAnomaly,
        Severity::Low,
        Some(aapl()),
        "AAPL drifted 1%",
    )
    .with_data("change_pct", json!(1.0));
    event.watchdog = "price_anomaly".into();
    stream.emit(event).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cache.get("price:AAPL:any").await.is_some());
}
