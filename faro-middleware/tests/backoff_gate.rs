use std::sync::Arc;
use std::time::Duration;

use faro_core::provider::Provider;
use faro_core::FaroError;
use faro_middleware::ProviderBuilder;
use faro_mock::MockProvider;
use faro_types::{Asset, AssetKind};

#[tokio::test]
async fn rate_limited_provider_is_parked() {
    let raw: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let wrapped = ProviderBuilder::new(raw)
        .with_backoff(Duration::from_secs(300))
        .build();
    let price = wrapped.as_price_provider().unwrap();

    // First call trips the upstream rate limit (magic symbol).
    let ratelimit = Asset::new("RATELIMIT", AssetKind::Equity).unwrap();
    assert!(matches!(
        price.fetch_price(&ratelimit).await.unwrap_err(),
        FaroError::RateLimited { .. }
    ));

    // A perfectly good symbol is now refused locally while parked.
    let aapl = Asset::new("AAPL", AssetKind::Equity).unwrap();
    let err = price.fetch_price(&aapl).await.unwrap_err();
    match err {
        FaroError::RateLimited { retry_after, .. } => {
            assert!(retry_after.unwrap() <= Duration::from_secs(60));
        }
        other => unreachable!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn gate_expires_after_retry_window() {
    struct ShortLimit {
        inner: MockProvider,
    }

    // A provider whose rate-limit hint is short enough to wait out in a test.
    #[async_trait::async_trait]
    impl Provider for ShortLimit {
        fn name(&self) -> &'static str {
            "short-limit"
        }
        fn supports_kind(&self, _k: AssetKind) -> bool {
            true
        }
        fn health(&self) -> faro_types::ProviderHealth {
            self.inner.health()
        }
        fn as_price_provider(&self) -> Option<&dyn faro_core::provider::PriceProvider> {
            Some(self as &dyn faro_core::provider::PriceProvider)
        }
    }

    #[async_trait::async_trait]
    impl faro_core::provider::PriceProvider for ShortLimit {
        async fn fetch_price(
            &self,
            asset: &Asset,
        ) -> Result<faro_core::ProviderResponse, FaroError> {
            if asset.symbol == "RATELIMIT" {
                return Err(FaroError::rate_limited(
                    "short-limit",
                    Some(Duration::from_millis(30)),
                ));
            }
            self.inner.as_price_provider().unwrap().fetch_price(asset).await
        }
    }

    let raw: Arc<dyn Provider> = Arc::new(ShortLimit {
        inner: MockProvider::new(),
    });
    let wrapped = ProviderBuilder::new(raw)
        .with_backoff(Duration::from_secs(300))
        .build();
    let price = wrapped.as_price_provider().unwrap();

    let ratelimit = Asset::new("RATELIMIT", AssetKind::Equity).unwrap();
    let _ = price.fetch_price(&ratelimit).await.unwrap_err();

    let aapl = Asset::new("AAPL", AssetKind::Equity).unwrap();
    assert!(price.fetch_price(&aapl).await.is_err(), "still parked");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(price.fetch_price(&aapl).await.is_ok(), "gate expired");
}
