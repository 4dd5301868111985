//! Middleware wrappers for faro providers.
//!
//! Two concerns live here, both applied per provider by the registry:
//!
//! - [`RateLimitGate`]: the provider's own request budget over a rolling
//!   window (`ProviderConfig::rate_limit_per_minute`).
//! - [`BackoffGate`]: parks a provider after an upstream rate-limit signal
//!   so fallback attempts stop hitting it until `retry_after` elapses.
//!
//! [`ProviderBuilder`] composes the layers in the supported order.
#![warn(missing_docs)]

mod backoff;
mod builder;
mod rate_limit;

pub use backoff::{BackoffGate, BackoffMiddleware};
pub use builder::ProviderBuilder;
pub use rate_limit::{RateLimitGate, RateLimitMiddleware};
