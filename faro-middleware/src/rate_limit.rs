//! Rolling-window rate limiting for provider call budgets.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use faro_core::middleware::{CallContext, Middleware};
use faro_core::provider::Provider;
use faro_core::{FaroError, faro_provider_accessors};
use faro_types::{Asset, AssetKind, ProviderHealth};

/// Wrapper that enforces a provider's own request budget.
///
/// The budget is a rolling one-minute-style window: `limit` calls per
/// `window`, resetting when the window elapses. Exhaustion surfaces as
/// [`FaroError::RateLimited`] carrying the time until the window resets, so
/// the arbitration engine can advance to a fallback and the backoff gate can
/// park the provider.
pub struct RateLimitGate {
    inner: Arc<dyn Provider>,
    runtime: Mutex<LimitRuntime>,
}

struct LimitRuntime {
    limit: u32,
    window: Duration,
    calls_in_window: u32,
    window_start: Instant,
}

impl RateLimitGate {
    /// Wrap `inner` with a budget of `limit` calls per `window`.
    #[must_use]
    pub fn new(inner: Arc<dyn Provider>, limit: u32, window: Duration) -> Self {
        Self {
            inner,
            runtime: Mutex::new(LimitRuntime {
                limit: limit.max(1),
                window,
                calls_in_window: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Check whether a call is allowed under the rolling window.
    ///
    /// # Errors
    /// Returns [`FaroError::RateLimited`] when the window budget is spent;
    /// `retry_after` reflects the time until the window resets.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn should_allow_call(&self) -> Result<(), FaroError> {
        let mut rt = self.runtime.lock().expect("mutex poisoned");
        let now = Instant::now();

        if now.duration_since(rt.window_start) >= rt.window {
            rt.calls_in_window = 0;
            rt.window_start = now;
        }

        if rt.calls_in_window < rt.limit {
            rt.calls_in_window += 1;
            return Ok(());
        }

        let elapsed = now.duration_since(rt.window_start);
        let retry_after = rt.window.saturating_sub(elapsed);
        drop(rt);
        Err(FaroError::rate_limited(
            self.inner.name(),
            Some(retry_after),
        ))
    }
}

#[async_trait]
impl Provider for RateLimitGate {
    fn name(&self) -> &'static str {
        self.inner.name()
    }
    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }
    fn supports_kind(&self, kind: AssetKind) -> bool {
        self.inner.supports_kind(kind)
    }
    fn supports_asset(&self, asset: &Asset) -> bool {
        self.inner.supports_asset(asset)
    }
    async fn initialize(&self) -> Result<(), FaroError> {
        self.inner.initialize().await
    }
    async fn shutdown(&self) -> Result<(), FaroError> {
        self.inner.shutdown().await
    }
    fn health(&self) -> ProviderHealth {
        self.inner.health()
    }
    fn last_request(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.last_request()
    }

    faro_provider_accessors!(inner);
}

faro_core::faro_delegate_provider_impls!(RateLimitGate, inner);

#[async_trait]
impl Middleware for RateLimitGate {
    fn apply(self: Box<Self>, _inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        unreachable!("RateLimitGate is already applied")
    }

    fn name(&self) -> &'static str {
        "RateLimitGate"
    }

    fn config_json(&self) -> serde_json::Value {
        let rt = self.runtime.lock().expect("mutex poisoned");
        serde_json::json!({
            "limit": rt.limit,
            "window_ms": rt.window.as_millis(),
        })
    }

    async fn pre_call(&self, _ctx: &CallContext) -> Result<(), FaroError> {
        self.should_allow_call()
    }

    fn map_error(&self, err: FaroError, _ctx: &CallContext) -> FaroError {
        // Upstreams that only expose a message still need to feed backoff.
        if let FaroError::Provider { provider, msg } = &err {
            let lower = msg.to_lowercase();
            let looks_like_rate_limit = lower.contains("rate limit")
                || lower.contains("429")
                || lower.contains("too many requests");
            if looks_like_rate_limit {
                return FaroError::rate_limited(provider.clone(), None);
            }
        }
        err
    }
}

/// Middleware config for constructing a [`RateLimitGate`].
pub struct RateLimitMiddleware {
    /// Calls allowed per window.
    pub limit: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitMiddleware {
    /// A per-minute budget, the shape provider configs express.
    #[must_use]
    pub const fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window: Duration::from_secs(60),
        }
    }
}

impl Middleware for RateLimitMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        Arc::new(RateLimitGate::new(inner, self.limit, self.window))
    }

    fn name(&self) -> &'static str {
        "RateLimitGate"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "limit": self.limit,
            "window_ms": self.window.as_millis(),
        })
    }
}
