use std::fmt;

use async_trait::async_trait;

use faro_types::{Asset, AssetKind, DataKind, ProviderHealth, ProviderKey};

use crate::{FaroError, ProviderResponse};

/// Candle granularity for OHLCV requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Timeframe {
    /// One-minute candles.
    M1,
    /// Five-minute candles.
    M5,
    /// Hourly candles.
    H1,
    /// Daily candles.
    D1,
    /// Weekly candles.
    W1,
}

impl Timeframe {
    /// Stable identifier used in provider requests and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::H1 => "1h",
            Self::D1 => "1d",
            Self::W1 => "1w",
        }
    }
}

/// Focused role trait for providers that serve point-in-time prices.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the current price payload for the given asset.
    async fn fetch_price(&self, asset: &Asset) -> Result<ProviderResponse, FaroError>;
}

/// Focused role trait for providers that serve OHLCV history.
///
/// Also the capability behind [`DataKind::Technical`]: indicator inputs are
/// derived from candles downstream of the core.
#[async_trait]
pub trait OhlcvProvider: Send + Sync {
    /// Fetch up to `limit` candles at the given timeframe.
    async fn fetch_ohlcv(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<ProviderResponse, FaroError>;
}

/// Focused role trait for providers that serve fundamentals.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Fetch the fundamentals payload for the given asset.
    async fn fetch_fundamentals(&self, asset: &Asset) -> Result<ProviderResponse, FaroError>;
}

/// Focused role trait for providers that serve news.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch up to `limit` recent articles for the given asset.
    async fn fetch_news(&self, asset: &Asset, limit: usize)
    -> Result<ProviderResponse, FaroError>;
}

/// Main provider trait implemented by upstream adapters.
///
/// Capability discovery follows the accessor pattern: a provider advertises a
/// capability by returning a usable trait object from the matching
/// `as_*_provider` method. Implementations must be safe for concurrent
/// invocation from the arbitration engine.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A stable identifier used in configuration, plans and lineage.
    fn name(&self) -> &'static str;

    /// Canonical provider key constructed from the static name.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Acquire sessions / validate credentials. Called once at startup;
    /// providers failing here are never registered.
    async fn initialize(&self) -> Result<(), FaroError> {
        Ok(())
    }

    /// Release upstream resources. Called once at shutdown.
    async fn shutdown(&self) -> Result<(), FaroError> {
        Ok(())
    }

    /// Whether this provider *claims* to cover a given asset kind.
    ///
    /// Default: `false` for all kinds; providers must explicitly override.
    fn supports_kind(&self, kind: AssetKind) -> bool {
        let _ = kind;
        false
    }

    /// Whether this provider can serve the specific asset.
    ///
    /// Defaults to the kind check; providers with symbol-level coverage
    /// rules override this.
    fn supports_asset(&self, asset: &Asset) -> bool {
        self.supports_kind(asset.kind)
    }

    /// Whether this provider advertises the capability behind `kind`.
    fn supports(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Price => self.as_price_provider().is_some(),
            DataKind::Ohlcv | DataKind::Technical => self.as_ohlcv_provider().is_some(),
            DataKind::Fundamentals => self.as_fundamentals_provider().is_some(),
            DataKind::News => self.as_news_provider().is_some(),
            _ => false,
        }
    }

    /// Self-reported operational health, derived from call statistics.
    fn health(&self) -> ProviderHealth;

    /// Timestamp of the most recent upstream call, the freshness signal the
    /// arbitration engine scores on. Providers with no traffic score neutral.
    fn last_request(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        None
    }

    /// Advertise price capability.
    fn as_price_provider(&self) -> Option<&dyn PriceProvider> {
        None
    }

    /// Advertise OHLCV capability.
    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        None
    }

    /// Advertise fundamentals capability.
    fn as_fundamentals_provider(&self) -> Option<&dyn FundamentalsProvider> {
        None
    }

    /// Advertise news capability.
    fn as_news_provider(&self) -> Option<&dyn NewsProvider> {
        None
    }
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}

/// Generate `as_*_provider` accessors for a wrapper that implements
/// [`Provider`] by delegating to an inner field.
///
/// The wrapper advertises exactly the capabilities its inner provider does,
/// but hands out trait objects pointing at itself so its own role-trait impls
/// (with middleware hooks) stay on the call path.
#[macro_export]
macro_rules! faro_provider_accessors {
    ($inner:ident) => {
        fn as_price_provider(&self) -> Option<&dyn $crate::provider::PriceProvider> {
            if self.$inner.as_price_provider().is_some() {
                Some(self as &dyn $crate::provider::PriceProvider)
            } else {
                None
            }
        }
        fn as_ohlcv_provider(&self) -> Option<&dyn $crate::provider::OhlcvProvider> {
            if self.$inner.as_ohlcv_provider().is_some() {
                Some(self as &dyn $crate::provider::OhlcvProvider)
            } else {
                None
            }
        }
        fn as_fundamentals_provider(&self) -> Option<&dyn $crate::provider::FundamentalsProvider> {
            if self.$inner.as_fundamentals_provider().is_some() {
                Some(self as &dyn $crate::provider::FundamentalsProvider)
            } else {
                None
            }
        }
        fn as_news_provider(&self) -> Option<&dyn $crate::provider::NewsProvider> {
            if self.$inner.as_news_provider().is_some() {
                Some(self as &dyn $crate::provider::NewsProvider)
            } else {
                None
            }
        }
    };
}

/// Generate all role-trait impls for a wrapper type `$self_ty`, delegating to
/// an inner field `$inner` and applying the [`Middleware`](crate::middleware::Middleware)
/// `pre_call`/`map_error` hooks around each call.
#[macro_export]
macro_rules! faro_delegate_provider_impls {
    ($self_ty:ty, $inner:ident) => {
        #[async_trait::async_trait]
        impl $crate::provider::PriceProvider for $self_ty {
            async fn fetch_price(
                &self,
                asset: &$crate::types::Asset,
            ) -> Result<$crate::ProviderResponse, $crate::FaroError> {
                let ctx = $crate::middleware::CallContext::new($crate::types::DataKind::Price);
                <Self as $crate::middleware::Middleware>::pre_call(self, &ctx).await?;
                let inner = self
                    .$inner
                    .as_price_provider()
                    .ok_or_else(|| $crate::FaroError::unsupported("price"))?;
                inner
                    .fetch_price(asset)
                    .await
                    .map_err(|e| <Self as $crate::middleware::Middleware>::map_error(self, e, &ctx))
            }
        }

        #[async_trait::async_trait]
        impl $crate::provider::OhlcvProvider for $self_ty {
            async fn fetch_ohlcv(
                &self,
                asset: &$crate::types::Asset,
                timeframe: $crate::provider::Timeframe,
                limit: usize,
            ) -> Result<$crate::ProviderResponse, $crate::FaroError> {
                let ctx = $crate::middleware::CallContext::new($crate::types::DataKind::Ohlcv);
                <Self as $crate::middleware::Middleware>::pre_call(self, &ctx).await?;
                let inner = self
                    .$inner
                    .as_ohlcv_provider()
                    .ok_or_else(|| $crate::FaroError::unsupported("ohlcv"))?;
                inner
                    .fetch_ohlcv(asset, timeframe, limit)
                    .await
                    .map_err(|e| <Self as $crate::middleware::Middleware>::map_error(self, e, &ctx))
            }
        }

        #[async_trait::async_trait]
        impl $crate::provider::FundamentalsProvider for $self_ty {
            async fn fetch_fundamentals(
                &self,
                asset: &$crate::types::Asset,
            ) -> Result<$crate::ProviderResponse, $crate::FaroError> {
                let ctx =
                    $crate::middleware::CallContext::new($crate::types::DataKind::Fundamentals);
                <Self as $crate::middleware::Middleware>::pre_call(self, &ctx).await?;
                let inner = self
                    .$inner
                    .as_fundamentals_provider()
                    .ok_or_else(|| $crate::FaroError::unsupported("fundamentals"))?;
                inner
                    .fetch_fundamentals(asset)
                    .await
                    .map_err(|e| <Self as $crate::middleware::Middleware>::map_error(self, e, &ctx))
            }
        }

        #[async_trait::async_trait]
        impl $crate::provider::NewsProvider for $self_ty {
            async fn fetch_news(
                &self,
                asset: &$crate::types::Asset,
                limit: usize,
            ) -> Result<$crate::ProviderResponse, $crate::FaroError> {
                let ctx = $crate::middleware::CallContext::new($crate::types::DataKind::News);
                <Self as $crate::middleware::Middleware>::pre_call(self, &ctx).await?;
                let inner = self
                    .$inner
                    .as_news_provider()
                    .ok_or_else(|| $crate::FaroError::unsupported("news"))?;
                inner
                    .fetch_news(asset, limit)
                    .await
                    .map_err(|e| <Self as $crate::middleware::Middleware>::map_error(self, e, &ctx))
            }
        }
    };
}
