//! Middleware trait for wrapping [`Provider`](crate::Provider) implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::FaroError;
use crate::provider::Provider;
use faro_types::DataKind;

/// Context describing the call a middleware hook is intercepting.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    kind: DataKind,
}

impl CallContext {
    /// Context for a call fetching `kind`.
    #[must_use]
    pub const fn new(kind: DataKind) -> Self {
        Self { kind }
    }

    /// Data kind being fetched.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.kind
    }
}

/// Trait implemented by provider middleware layers.
///
/// A middleware consumes an inner [`Provider`] and returns a wrapped provider
/// that augments or restricts behavior (rate limiting, backoff gating). The
/// `pre_call`/`map_error` hooks are what the delegation macro threads through
/// every capability call.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Wrap an inner provider and return the wrapped provider.
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;

    /// Hook invoked before the inner call; failing here skips the upstream.
    async fn pre_call(&self, ctx: &CallContext) -> Result<(), FaroError> {
        let _ = ctx;
        Ok(())
    }

    /// Hook invoked on inner-call errors; used to translate or record them.
    fn map_error(&self, err: FaroError, ctx: &CallContext) -> FaroError {
        let _ = ctx;
        err
    }
}
