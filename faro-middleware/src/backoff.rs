//! Backoff gating after upstream rate-limit signals.
//!
//! Once a provider reports [`FaroError::RateLimited`], every further call is
//! refused locally until the advertised `retry_after` (or a configured
//! default) elapses. This keeps the arbitration engine from burning fallback
//! attempts on a provider that already said no.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use faro_core::middleware::{CallContext, Middleware};
use faro_core::provider::Provider;
use faro_core::{FaroError, faro_provider_accessors};
use faro_types::{Asset, AssetKind, ProviderHealth};
use tracing::debug;

/// Wrapper that parks its inner provider for a period after rate limiting.
pub struct BackoffGate {
    inner: Arc<dyn Provider>,
    state: Mutex<Option<Instant>>, // gated-until; None means active
    default_duration: Duration,
}

impl BackoffGate {
    /// Wrap `inner`, parking it for `default_duration` when the upstream
    /// does not say how long to wait.
    #[must_use]
    pub fn new(inner: Arc<dyn Provider>, default_duration: Duration) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
            default_duration,
        }
    }

    fn gate_remaining(&self) -> Option<Duration> {
        let mut guard = self.state.lock().expect("mutex poisoned");
        let now = Instant::now();
        if let Some(until) = *guard {
            if now < until {
                return Some(until.saturating_duration_since(now));
            }
            // expired
            *guard = None;
        }
        None
    }

    fn gate_until(&self, until: Instant) {
        let mut guard = self.state.lock().expect("mutex poisoned");
        *guard = Some(until);
    }

    fn handle_error(&self, err: FaroError) -> FaroError {
        if let FaroError::RateLimited { retry_after, .. } = &err {
            let duration = retry_after.unwrap_or(self.default_duration);
            debug!(
                target = "faro::middleware::backoff",
                provider = self.inner.name(),
                backoff_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "provider rate limited, gating"
            );
            self.gate_until(Instant::now() + duration);
        }
        err
    }
}

#[async_trait]
impl Provider for BackoffGate {
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

faro_core::faro_delegate_provider_impls!(BackoffGate, inner);

#[async_trait]
impl Middleware for BackoffGate {
    fn apply(self: Box<Self>, _inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        unreachable!("BackoffGate is already applied")
    }

    fn name(&self) -> &'static str {
        "BackoffGate"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "default_duration_ms": self.default_duration.as_millis(),
        })
    }

    async fn pre_call(&self, _ctx: &CallContext) -> Result<(), FaroError> {
        if let Some(remaining) = self.gate_remaining() {
            return Err(FaroError::rate_limited(self.inner.name(), Some(remaining)));
        }
        Ok(())
    }

    fn map_error(&self, err: FaroError, _ctx: &CallContext) -> FaroError {
        self.handle_error(err)
    }
}

/// Middleware config for constructing a [`BackoffGate`].
pub struct BackoffMiddleware {
    /// Gate duration used when the upstream did not advertise one.
    pub duration: Duration,
}

impl BackoffMiddleware {
    /// Gate for `duration` by default.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Middleware for BackoffMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        Arc::new(BackoffGate::new(inner, self.duration))
    }

    fn name(&self) -> &'static str {
        "BackoffGate"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "default_duration_ms": self.duration.as_millis(),
        })
    }
}
