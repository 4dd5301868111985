use std::sync::Arc;
use std::time::Duration;

use faro_core::provider::Provider;
use faro_middleware::ProviderBuilder;
use faro_mock::MockProvider;
use faro_types::{Asset, AssetKind};

#[test]
fn backoff_sits_outside_rate_limit_regardless_of_insertion_order() {
    let raw: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let builder = ProviderBuilder::new(raw)
        .with_rate_limit(10, Duration::from_secs(60))
        .with_backoff(Duration::from_secs(120));

    let names: Vec<String> = builder.stack().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["BackoffGate", "RateLimitGate", "RawProvider"]);

    let raw2: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let builder2 = ProviderBuilder::new(raw2)
        .with_backoff(Duration::from_secs(120))
        .with_rate_limit(10, Duration::from_secs(60));
    let names2: Vec<String> = builder2.stack().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, names2);
}

#[test]
fn replacing_a_layer_keeps_one_instance() {
    let raw: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let builder = ProviderBuilder::new(raw)
        .with_rate_limit(10, Duration::from_secs(60))
        .with_rate_limit(99, Duration::from_secs(60));

    let stack = builder.stack();
    assert_eq!(stack.len(), 2); // one gate + raw
    assert_eq!(stack[0].1["limit"], 99);
}

#[tokio::test]
async fn unwrapped_capabilities_pass_through() {
    let raw: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let wrapped = ProviderBuilder::new(raw)
        .with_rate_limit(100, Duration::from_secs(60))
        .with_backoff(Duration::from_secs(60))
        .build();

    assert_eq!(wrapped.name(), "mock");
    assert!(wrapped.supports_kind(AssetKind::Crypto));
    assert!(wrapped.as_news_provider().is_some());

    let asset = Asset::new("BTC", AssetKind::Crypto).unwrap();
    let resp = wrapped
        .as_fundamentals_provider()
        .unwrap()
        .fetch_fundamentals(&asset)
        .await
        .unwrap();
    assert!(resp.number("market_cap").unwrap() > 0.0);
}
