//! faro-alerts
//!
//! User-defined alerts over the watchdog event stream. The engine owns
//! [`AlertConfig`](faro_types::AlertConfig)s, subscribes each one with its
//! filter, enforces per-alert cooldowns, and fans deliveries out over email,
//! Telegram and webhooks through a bounded queue drained by a dedicated
//! worker, so the event dispatcher is never blocked on I/O.
#![warn(missing_docs)]

/// Delivery channel implementations.
pub mod delivery;
mod engine;

pub use engine::{AlertEngine, AlertEngineConfig, OverflowPolicy};
