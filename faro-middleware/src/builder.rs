//! Builder for composing providers with middleware layers.
//!
//! Layers form an "onion" around the raw provider:
//!
//! ```text
//! Arbitration Engine
//!     ↓
//! BackoffGate   (fails fast while a provider is parked, observes errors last)
//!     ↓
//! RateLimitGate (spends the local call budget)
//!     ↓
//! Raw provider  (makes the actual upstream calls)
//! ```
//!
//! The `layers` vector stores middleware outermost-first; `build()` applies
//! them in reverse so `layers[0]` ends up closest to the caller.

use std::sync::Arc;
use std::time::Duration;

use faro_core::Middleware;
use faro_core::provider::Provider;
use serde_json::json;

/// Generic middleware builder for composing a provider with layered wrappers.
pub struct ProviderBuilder {
    raw: Arc<dyn Provider>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ProviderBuilder {
    /// Create a new builder from a raw, unwrapped provider.
    #[must_use]
    pub fn new(raw: Arc<dyn Provider>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Reorder layers to satisfy the helper ordering policy:
    /// backoff (outermost) -> rate limit -> others (stable among themselves).
    fn enforce_ordering(&mut self) {
        self.layers.sort_by_key(|m| match m.name() {
            "BackoffGate" => 0,
            "RateLimitGate" => 1,
            _ => 2,
        });
    }

    /// Add or replace the rolling-window rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32, window: Duration) -> Self {
        self.layers.retain(|m| m.name() != "RateLimitGate");
        self.layers
            .push(Box::new(crate::rate_limit::RateLimitMiddleware {
                limit,
                window,
            }));
        self.enforce_ordering();
        self
    }

    /// Add or replace the post-rate-limit backoff gate.
    #[must_use]
    pub fn with_backoff(mut self, duration: Duration) -> Self {
        self.layers.retain(|m| m.name() != "BackoffGate");
        self.layers
            .push(Box::new(crate::backoff::BackoffMiddleware::new(duration)));
        self.enforce_ordering();
        self
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer<M: Middleware + 'static>(mut self, layer: M) -> Self {
        self.layers.insert(0, Box::new(layer));
        self
    }

    /// Snapshot the stack for inspection/logging, outermost first, with the
    /// raw provider documented as the innermost entry.
    #[must_use]
    pub fn stack(&self) -> Vec<(String, serde_json::Value)> {
        let mut out: Vec<(String, serde_json::Value)> = self
            .layers
            .iter()
            .map(|m| (m.name().to_string(), m.config_json()))
            .collect();
        out.push(("RawProvider".into(), json!({ "name": self.raw.name() })));
        out
    }

    /// Build the wrapped provider by applying layers innermost-first.
    #[must_use]
    pub fn build(self) -> Arc<dyn Provider> {
        let mut acc: Arc<dyn Provider> = Arc::clone(&self.raw);
        for layer in self.layers.into_iter().rev() {
            acc = layer.apply(acc);
        }
        acc
    }
}
