//! In-process publish/subscribe event stream with bounded history, an
//! optional durable sink and an optional broadcaster.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::{EventFilter, WatchdogEvent};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Synchronous subscriber callback.
///
/// Callbacks run inside the dispatcher and must return quickly; subscribers
/// that do I/O enqueue work onto their own queues (the alert engine's
/// delivery queue is the canonical example).
pub type EventCallback = Arc<dyn Fn(&WatchdogEvent) + Send + Sync>;

/// Append-only durable event log.
///
/// Entries are flat string maps; implementations cap their length and drop
/// the oldest entries. Consumers resume by passing the last id they saw.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one entry, returning its assigned id.
    async fn append(&self, entry: BTreeMap<String, String>) -> Result<String, FaroError>;

    /// Read up to `count` entries strictly after `start_id` (or from the
    /// start when `None`).
    async fn read_from(
        &self,
        start_id: Option<&str>,
        count: usize,
    ) -> Result<Vec<(String, BTreeMap<String, String>)>, FaroError>;
}

/// Fan-out hook for transports (e.g. a WebSocket hub).
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    /// Forward one event; failures are the broadcaster's to log.
    async fn broadcast(&self, event: &WatchdogEvent);
}

/// In-memory [`EventSink`] capped at a fixed number of entries.
pub struct MemoryEventLog {
    cap: usize,
    entries: Mutex<(u64, VecDeque<(u64, BTreeMap<String, String>)>)>,
}

impl MemoryEventLog {
    /// Log capped at `cap` entries; older entries are dropped.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Mutex::new((0, VecDeque::new())),
        }
    }

    /// Log with the default ~10k cap.
    #[must_use]
    pub fn with_default_cap() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl EventSink for MemoryEventLog {
    async fn append(&self, entry: BTreeMap<String, String>) -> Result<String, FaroError> {
        let mut guard = self.entries.lock().expect("event log mutex poisoned");
        let (next_id, entries) = &mut *guard;
        *next_id += 1;
        let id = *next_id;
        entries.push_back((id, entry));
        while entries.len() > self.cap {
            entries.pop_front();
        }
        Ok(id.to_string())
    }

    async fn read_from(
        &self,
        start_id: Option<&str>,
        count: usize,
    ) -> Result<Vec<(String, BTreeMap<String, String>)>, FaroError> {
        let after: u64 = match start_id {
            Some(raw) => raw
                .parse()
                .map_err(|_| FaroError::InvalidArg(format!("bad event log id: {raw}")))?,
            None => 0,
        };
        let guard = self.entries.lock().expect("event log mutex poisoned");
        Ok(guard
            .1
            .iter()
            .filter(|(id, _)| *id > after)
            .take(count)
            .map(|(id, entry)| (id.to_string(), entry.clone()))
            .collect())
    }
}

#[derive(Clone)]
struct Subscriber {
    id: String,
    filter: EventFilter,
    callback: EventCallback,
}

#[derive(Default)]
struct Counters {
    total_events: u64,
    by_type: HashMap<&'static str, u64>,
    by_severity: HashMap<&'static str, u64>,
}

/// Aggregate statistics for dashboards and the manager status rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStreamStats {
    /// Events emitted since construction.
    pub total_events: u64,
    /// Emissions per event type.
    pub events_by_type: HashMap<&'static str, u64>,
    /// Emissions per severity.
    pub events_by_severity: HashMap<&'static str, u64>,
    /// Currently registered subscribers.
    pub active_subscribers: usize,
    /// Events currently held in the ring buffer.
    pub history_size: usize,
    /// Whether a durable sink is attached.
    pub persistence_enabled: bool,
    /// Whether a broadcaster is attached.
    pub broadcast_enabled: bool,
}

/// Publish/subscribe bus for watchdog events.
///
/// Ordering contract: subscribers for a single event are invoked in
/// registration order, one subscriber's panic does not stop delivery to the
/// rest, and emissions are observed FIFO by every subscriber (emission holds
/// no await points between history append and dispatch).
pub struct EventStream {
    max_history: usize,
    subscribers: Mutex<Vec<Subscriber>>,
    history: Mutex<VecDeque<WatchdogEvent>>,
    counters: Mutex<Counters>,
    sink: Option<Arc<dyn EventSink>>,
    broadcaster: Option<Arc<dyn EventBroadcaster>>,
}

impl EventStream {
    /// Stream with a bounded in-memory history and no sink or broadcaster.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            subscribers: Mutex::new(Vec::new()),
            history: Mutex::new(VecDeque::new()),
            counters: Mutex::new(Counters::default()),
            sink: None,
            broadcaster: None,
        }
    }

    /// Attach a durable sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach a broadcaster.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Emit an event: count it, remember it, persist it, broadcast it, then
    /// notify matching subscribers in registration order.
    pub async fn emit(&self, event: WatchdogEvent) {
        debug!(
            target = "faro::watchdog::events",
            event_type = %event.event_type,
            severity = %event.severity,
            watchdog = %event.watchdog,
            "emitting event"
        );

        {
            let mut counters = self.counters.lock().expect("counters mutex poisoned");
            counters.total_events += 1;
            *counters
                .by_type
                .entry(event.event_type.as_str())
                .or_insert(0) += 1;
            *counters
                .by_severity
                .entry(event.severity.as_str())
                .or_insert(0) += 1;
        }

        {
            let mut history = self.history.lock().expect("history mutex poisoned");
            history.push_back(event.clone());
            while history.len() > self.max_history {
                history.pop_front();
            }
        }

        if let Some(sink) = &self.sink
            && let Err(e) = sink.append(event.to_flat_map()).await
        {
            error!(target = "faro::watchdog::events", error = %e, "failed to persist event");
        }

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(&event).await;
        }

        // Snapshot under the lock, dispatch outside it so callbacks may
        // subscribe/unsubscribe without deadlocking.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .clone();
        for subscriber in subscribers {
            if !subscriber.filter.matches(&event) {
                continue;
            }
            let callback = Arc::clone(&subscriber.callback);
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                error!(
                    target = "faro::watchdog::events",
                    subscriber = %subscriber.id,
                    "subscriber panicked while handling event"
                );
            }
        }
    }

    /// Register a subscriber.
    ///
    /// # Errors
    /// Returns `InvalidArg` when a caller-supplied id is already taken.
    pub fn subscribe(
        &self,
        callback: EventCallback,
        filter: Option<EventFilter>,
        id: Option<String>,
    ) -> Result<String, FaroError> {
        let id = id.unwrap_or_else(|| format!("sub_{}", Uuid::new_v4().simple()));
        let mut subscribers = self.subscribers.lock().expect("subscriber mutex poisoned");
        if subscribers.iter().any(|s| s.id == id) {
            return Err(FaroError::InvalidArg(format!(
                "subscriber id already in use: {id}"
            )));
        }
        subscribers.push(Subscriber {
            id: id.clone(),
            filter: filter.unwrap_or_default(),
            callback,
        });
        info!(target = "faro::watchdog::events", subscriber = %id, "new subscriber");
        Ok(id)
    }

    /// Remove a subscriber; `true` when it existed.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let mut subscribers = self.subscribers.lock().expect("subscriber mutex poisoned");
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            info!(target = "faro::watchdog::events", subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Recent events, newest first, optionally filtered.
    #[must_use]
    pub fn get_history(&self, filter: Option<&EventFilter>, limit: usize) -> Vec<WatchdogEvent> {
        let history = self.history.lock().expect("history mutex poisoned");
        history
            .iter()
            .rev()
            .filter(|e| filter.is_none_or(|f| f.matches(e)))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Read persisted entries from the durable sink, empty without one.
    pub async fn get_persisted(
        &self,
        start_id: Option<&str>,
        count: usize,
    ) -> Result<Vec<(String, BTreeMap<String, String>)>, FaroError> {
        match &self.sink {
            Some(sink) => sink.read_from(start_id, count).await,
            None => Ok(Vec::new()),
        }
    }

    /// Aggregate statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> EventStreamStats {
        let counters = self.counters.lock().expect("counters mutex poisoned");
        EventStreamStats {
            total_events: counters.total_events,
            events_by_type: counters.by_type.clone(),
            events_by_severity: counters.by_severity.clone(),
            active_subscribers: self
                .subscribers
                .lock()
                .expect("subscriber mutex poisoned")
                .len(),
            history_size: self.history.lock().expect("history mutex poisoned").len(),
            persistence_enabled: self.sink.is_some(),
            broadcast_enabled: self.broadcaster.is_some(),
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .len()
    }

    /// Drop all subscribers; history and counters are retained for
    /// post-mortem inspection.
    pub fn shutdown(&self) {
        info!(target = "faro::watchdog::events", "shutting down event stream");
        self.subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .clear();
    }
}
