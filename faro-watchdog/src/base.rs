//! The watchdog runner: periodic check loop, retries, health bookkeeping and
//! cooperative shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faro_core::FaroError;
use faro_types::{EventType, WatchdogConfig, WatchdogEvent, WatchdogHealth, WatchdogStatus};
use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::events::EventStream;

/// A periodic anomaly check.
///
/// Implementations return `Ok(Some(event))` when an anomaly is detected,
/// `Ok(None)` on a quiet check, and `Err` on check failure; the runner wraps
/// failures with retries and health accounting.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Unique detector name; stamped onto every emitted event.
    fn name(&self) -> &'static str;

    /// Perform one check.
    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError>;
}

/// Handle over a spawned monitoring loop.
///
/// Mirrors the stop/abort contract of long-lived stream tasks: prefer a
/// graceful `stop`, and dropping the handle sends a best-effort stop signal
/// before aborting the task.
#[derive(Debug)]
struct LoopHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl LoopHandle {
    const fn new(inner: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            inner: Some(inner),
            stop_tx: Some(stop_tx),
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(inner) = self.inner.take() {
            let _ = inner.await;
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(inner) = self.inner.take() {
            inner.abort();
        }
    }
}

#[derive(Debug)]
struct HealthState {
    status: WatchdogStatus,
    last_check: Option<DateTime<Utc>>,
    last_event: Option<DateTime<Utc>>,
    total_checks: u64,
    events_emitted: u64,
    errors: u64,
    consecutive_failures: u32,
    started_at: Option<Instant>,
}

impl HealthState {
    const fn new() -> Self {
        Self {
            status: WatchdogStatus::Initialized,
            last_check: None,
            last_event: None,
            total_checks: 0,
            events_emitted: 0,
            errors: 0,
            consecutive_failures: 0,
            started_at: None,
        }
    }
}

/// Runner that owns one [`Detector`] and executes its check loop.
pub struct Watchdog {
    detector: Arc<dyn Detector>,
    config: WatchdogConfig,
    enabled: AtomicBool,
    running: Arc<AtomicBool>,
    health: Arc<Mutex<HealthState>>,
    handle: tokio::sync::Mutex<Option<LoopHandle>>,
}

impl Watchdog {
    /// Wrap a detector with its loop configuration.
    #[must_use]
    pub fn new(detector: Arc<dyn Detector>, config: WatchdogConfig) -> Self {
        let enabled = config.enabled;
        Self {
            detector,
            config,
            enabled: AtomicBool::new(enabled),
            running: Arc::new(AtomicBool::new(false)),
            health: Arc::new(Mutex::new(HealthState::new())),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Detector name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.detector.name()
    }

    /// Whether the watchdog is allowed to run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle whether `start` will do anything.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether the monitoring loop is live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the monitoring loop.
    ///
    /// Disabled watchdogs ignore this call and stay `Initialized`; starting
    /// twice is a logged no-op.
    pub async fn start(&self, stream: Arc<EventStream>) {
        if !self.is_enabled() {
            info!(
                target = "faro::watchdog",
                watchdog = self.name(),
                "watchdog is disabled, not starting"
            );
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(
                target = "faro::watchdog",
                watchdog = self.name(),
                "watchdog is already running"
            );
            return;
        }

        info!(target = "faro::watchdog", watchdog = self.name(), "starting watchdog");
        {
            let mut health = self.health.lock().expect("health mutex poisoned");
            health.status = WatchdogStatus::Healthy;
            health.started_at = Some(Instant::now());
            health.consecutive_failures = 0;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let detector = Arc::clone(&self.detector);
        let config = self.config.clone();
        let health = Arc::clone(&self.health);
        let running = Arc::clone(&self.running);
        let task = tokio::spawn(async move {
            monitoring_loop(detector, config, health, stream, stop_rx).await;
            running.store(false, Ordering::SeqCst);
        });

        *self.handle.lock().await = Some(LoopHandle::new(task, stop_tx));
    }

    /// Signal shutdown and await loop completion.
    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            info!(target = "faro::watchdog", watchdog = self.name(), "stopping watchdog");
            handle.stop().await;
        }
        self.running.store(false, Ordering::SeqCst);
        let mut health = self.health.lock().expect("health mutex poisoned");
        health.status = WatchdogStatus::Stopped;
    }

    /// Current health snapshot (copy; detector state stays private).
    #[must_use]
    pub fn get_health(&self) -> WatchdogHealth {
        let health = self.health.lock().expect("health mutex poisoned");
        WatchdogHealth {
            name: self.name().to_string(),
            status: health.status,
            last_check: health.last_check,
            last_event: health.last_event,
            total_checks: health.total_checks,
            events_emitted: health.events_emitted,
            errors: health.errors,
            consecutive_failures: health.consecutive_failures,
            uptime_seconds: health
                .started_at
                .map_or(0.0, |t| t.elapsed().as_secs_f64()),
        }
    }
}

async fn monitoring_loop(
    detector: Arc<dyn Detector>,
    config: WatchdogConfig,
    health: Arc<Mutex<HealthState>>,
    stream: Arc<EventStream>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    info!(
        target = "faro::watchdog",
        watchdog = detector.name(),
        interval_s = config.check_interval_seconds,
        "monitoring loop started"
    );

    loop {
        match check_with_retry(detector.as_ref(), &config).await {
            Ok(outcome) => {
                {
                    let mut h = health.lock().expect("health mutex poisoned");
                    h.last_check = Some(Utc::now());
                    h.total_checks += 1;
                    h.consecutive_failures = 0;
                    h.status = WatchdogStatus::Healthy;
                }
                if let Some(mut event) = outcome {
                    event.watchdog = detector.name().to_string();
                    let (event_type, severity) = (event.event_type, event.severity);
                    stream.emit(event).await;
                    let mut h = health.lock().expect("health mutex poisoned");
                    h.events_emitted += 1;
                    h.last_event = Some(Utc::now());
                    info!(
                        target = "faro::watchdog",
                        watchdog = detector.name(),
                        event_type = %event_type,
                        severity = %severity,
                        "event emitted"
                    );
                }
            }
            Err(e) => {
                error!(
                    target = "faro::watchdog",
                    watchdog = detector.name(),
                    error = %e,
                    "monitoring check failed"
                );
                let mut h = health.lock().expect("health mutex poisoned");
                h.last_check = Some(Utc::now());
                h.total_checks += 1;
                h.errors += 1;
                h.consecutive_failures += 1;
                h.status = if h.consecutive_failures >= config.max_retries {
                    WatchdogStatus::Unhealthy
                } else {
                    WatchdogStatus::Degraded
                };
            }
        }

        tokio::select! {
            _ = &mut stop_rx => break,
            () = tokio::time::sleep(config.check_interval()) => {}
        }
    }

    info!(
        target = "faro::watchdog",
        watchdog = detector.name(),
        "monitoring loop exited"
    );
}

async fn check_with_retry(
    detector: &dyn Detector,
    config: &WatchdogConfig,
) -> Result<Option<WatchdogEvent>, FaroError> {
    let attempts = config.max_retries.max(1);
    let mut last_error: Option<FaroError> = None;

    for attempt in 1..=attempts {
        match detector.check().await {
            Ok(event) => return Ok(event),
            Err(e) => {
                warn!(
                    target = "faro::watchdog",
                    watchdog = detector.name(),
                    attempt,
                    max = attempts,
                    error = %e,
                    "check attempt failed"
                );
                last_error = Some(e);
                if attempt < attempts {
                    // Jitter the retry delay to decorrelate detector fleets.
                    let base_ms = config.retry_delay().as_millis() as u64;
                    let jitter_ms = if base_ms == 0 {
                        0
                    } else {
                        rand::rng().random_range(0..=base_ms / 5)
                    };
                    tokio::time::sleep(Duration::from_millis(base_ms + jitter_ms)).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| FaroError::CheckFailed(format!("{}: no error recorded", detector.name()))))
}

/// Per-detector duplicate suppression.
///
/// A detector that just fired for `(symbol, event_type)` holds further
/// identical emissions until the window closes; this is detector state, not
/// the event stream's concern.
pub struct Debouncer {
    window: Duration,
    last_fired: Mutex<HashMap<(String, EventType), Instant>>,
}

impl Debouncer {
    /// Suppression window of `window` per `(symbol, event_type)` pair.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an emission for this pair is allowed now; allowed emissions
    /// restart the window.
    #[must_use]
    pub fn should_emit(&self, symbol: &str, event_type: EventType) -> bool {
        let mut last = self.last_fired.lock().expect("debounce mutex poisoned");
        let key = (symbol.to_string(), event_type);
        let now = Instant::now();
        match last.get(&key) {
            Some(at) if now.duration_since(*at) < self.window => false,
            _ => {
                last.insert(key, now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_suppresses_within_window() {
        let debounce = Debouncer::new(Duration::from_secs(60));
        assert!(debounce.should_emit("AAPL", EventType::PriceAnomaly));
        assert!(!debounce.should_emit("AAPL", EventType::PriceAnomaly));
        // A different pair is independent.
        assert!(debounce.should_emit("AAPL", EventType::FlashCrash));
        assert!(debounce.should_emit("TSLA", EventType::PriceAnomaly));
    }

    #[test]
    fn debouncer_reopens_after_window() {
        let debounce = Debouncer::new(Duration::from_millis(10));
        assert!(debounce.should_emit("BTC", EventType::WhaleMovement));
        std::thread::sleep(Duration::from_millis(15));
        assert!(debounce.should_emit("BTC", EventType::WhaleMovement));
    }
}
