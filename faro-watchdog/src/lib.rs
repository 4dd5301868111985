//! faro-watchdog
//!
//! The anomaly-monitoring subsystem: an in-process pub/sub [`EventStream`]
//! with bounded history and an optional durable sink, a [`Watchdog`] runner
//! that executes [`Detector`] checks on an interval with retries and health
//! tracking, eight concrete detectors, and the [`WatchdogManager`] owning
//! the fleet's lifecycle.
#![warn(missing_docs)]

/// Detector trait, watchdog runner and debounce helper.
pub mod base;
/// The eight concrete detectors and their source contracts.
pub mod detectors;
/// Publish/subscribe event stream with history, sink and broadcaster.
pub mod events;
/// Fleet lifecycle management.
pub mod manager;

pub use base::{Debouncer, Detector, Watchdog};
pub use events::{
    EventBroadcaster, EventCallback, EventSink, EventStream, EventStreamStats, MemoryEventLog,
};
pub use manager::{DetectorSources, ManagerStatus, WatchdogManager, WatchdogSettings};
