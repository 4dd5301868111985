use std::time::Duration;

use faro_types::{DataKind, Region};
use thiserror::Error;

/// Unified error type for the faro workspace.
///
/// This covers the upstream failure taxonomy providers map their native
/// errors into, plus configuration, cache and compliance failures raised by
/// the core itself. The arbitration engine keys its fallback decisions on
/// these variants, so providers must map faithfully.
#[derive(Debug, Clone, Error)]
pub enum FaroError {
    /// The provider's rate limit was hit; back off before retrying.
    #[error("{provider} rate limited")]
    RateLimited {
        /// Provider that refused the call.
        provider: String,
        /// Suggested wait before the next attempt, when the upstream said.
        retry_after: Option<Duration>,
    },

    /// An individual provider call exceeded its configured timeout.
    #[error("provider timed out: {kind} via {provider}")]
    ProviderTimeout {
        /// Provider that timed out.
        provider: String,
        /// Data kind being fetched.
        kind: DataKind,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {kind}")]
    RequestTimeout {
        /// Data kind for which the request timed out.
        kind: DataKind,
    },

    /// The provider refuses to serve callers from this region.
    #[error("{provider} unavailable in region {region}")]
    RegionRestricted {
        /// Provider that refused.
        provider: String,
        /// Caller region.
        region: Region,
    },

    /// The provider does not cover this asset/data-kind pair.
    #[error("{provider} does not support {kind}")]
    NotSupported {
        /// Provider that declined.
        provider: String,
        /// Requested data kind.
        kind: DataKind,
    },

    /// The requested capability is not implemented by the target provider.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability string describing what was requested (e.g. "price").
        capability: &'static str,
    },

    /// Generic upstream failure tagged with the provider name.
    #[error("{provider} failed: {msg}")]
    Provider {
        /// Provider that failed.
        provider: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The registry has no enabled provider for this asset/data-kind pair.
    #[error("no provider available for {symbol} ({kind})")]
    NoProviderAvailable {
        /// Requested symbol.
        symbol: String,
        /// Requested data kind.
        kind: DataKind,
    },

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "price for AAPL".
        what: String,
    },

    /// Startup-fatal configuration problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// A cache tier failed; the cache manager degrades to direct fetches.
    #[error("cache error: {0}")]
    Cache(String),

    /// Strict-mode guardrail refused to release the text.
    #[error("compliance blocked: {violations} violations")]
    ComplianceBlocked {
        /// Number of violations found.
        violations: usize,
    },

    /// A watchdog check failed after exhausting its retries.
    #[error("check failed: {0}")]
    CheckFailed(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// All attempted providers failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<FaroError>),
}

impl FaroError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub const fn unsupported(capability: &'static str) -> Self {
        Self::Unsupported { capability }
    }

    /// Helper: build a `Provider` error with the provider name and message.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a missing resource description.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after,
        }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(provider: impl Into<String>, kind: DataKind) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            kind,
        }
    }

    /// Helper: build a `NotSupported` error.
    pub fn not_supported(provider: impl Into<String>, kind: DataKind) -> Self {
        Self::NotSupported {
            provider: provider.into(),
            kind,
        }
    }

    /// Helper: build a `RegionRestricted` error.
    pub fn region_restricted(provider: impl Into<String>, region: Region) -> Self {
        Self::RegionRestricted {
            provider: provider.into(),
            region,
        }
    }

    /// Whether retrying later could plausibly succeed.
    ///
    /// Fallback and backoff logic treat transient failures as "advance to
    /// the next provider"; permanent ones additionally poison negative
    /// routing state (regional penalties).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ProviderTimeout { .. }
                | Self::RequestTimeout { .. }
                | Self::Provider { .. }
                | Self::Cache(_)
                | Self::CheckFailed(_)
        )
    }

    /// Inverse of [`is_transient`](Self::is_transient).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}
