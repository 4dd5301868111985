//! Alert CRUD, event-stream subscriptions, cooldowns and queued fan-out.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use faro_core::FaroError;
use faro_types::{AlertConfig, DeliveryMethod, EmailConfig, TelegramConfig, WatchdogEvent};
use faro_watchdog::EventStream;
use futures::future::join_all;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::delivery;

/// What to do when the delivery queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the incoming job (log and drop newest).
    #[default]
    DropNewest,
    /// Evict the oldest queued job to make room.
    DropOldest,
}

/// Engine construction parameters.
#[derive(Clone, Default)]
pub struct AlertEngineConfig {
    /// Email settings injected into alerts that request email delivery
    /// without their own configuration.
    pub default_email: Option<EmailConfig>,
    /// Telegram settings injected into alerts that request Telegram delivery
    /// without their own configuration.
    pub default_telegram: Option<TelegramConfig>,
    /// Delivery queue capacity; zero means the default of 256.
    pub queue_capacity: usize,
    /// Behavior when the queue is full.
    pub overflow: OverflowPolicy,
    /// Telegram API base URL override (tests point this at a local server).
    pub telegram_api_base: Option<String>,
}

struct DeliveryJob {
    alert: AlertConfig,
    event: WatchdogEvent,
}

struct DeliveryQueue {
    capacity: usize,
    overflow: OverflowPolicy,
    jobs: Mutex<VecDeque<DeliveryJob>>,
    notify: Notify,
    closed: AtomicBool,
}

impl DeliveryQueue {
    fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            overflow,
            jobs: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue without blocking the event dispatcher.
    fn push(&self, job: DeliveryJob) {
        {
            let mut jobs = self.jobs.lock().expect("queue mutex poisoned");
            if jobs.len() >= self.capacity {
                match self.overflow {
                    OverflowPolicy::DropNewest => {
                        warn!(
                            target = "faro::alerts",
                            alert = %job.alert.name,
                            "delivery queue full, dropping newest job"
                        );
                        return;
                    }
                    OverflowPolicy::DropOldest => {
                        if let Some(evicted) = jobs.pop_front() {
                            warn!(
                                target = "faro::alerts",
                                alert = %evicted.alert.name,
                                "delivery queue full, dropped oldest job"
                            );
                        }
                    }
                }
            }
            jobs.push_back(job);
        }
        self.notify.notify_one();
    }

    async fn pop(&self) -> Option<DeliveryJob> {
        loop {
            {
                let mut jobs = self.jobs.lock().expect("queue mutex poisoned");
                if let Some(job) = jobs.pop_front() {
                    return Some(job);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

struct EngineInner {
    alerts: Mutex<HashMap<String, AlertConfig>>,
    subscriptions: Mutex<HashMap<String, String>>,
    queue: DeliveryQueue,
    config: AlertEngineConfig,
}

impl EngineInner {
    /// Event-stream callback body: gate, account, enqueue. Runs inside the
    /// dispatcher and must not block.
    fn handle_event(&self, alert_id: &str, event: &WatchdogEvent) {
        let snapshot = {
            let mut alerts = self.alerts.lock().expect("alert mutex poisoned");
            let Some(alert) = alerts.get_mut(alert_id) else {
                return;
            };
            if !alert.enabled {
                return;
            }

            let now = Utc::now();
            if let Some(last) = alert.last_triggered {
                let since = (now - last).to_std().unwrap_or_default();
                if since < alert.cooldown() {
                    debug!(
                        target = "faro::alerts",
                        alert = %alert.name,
                        since_s = since.as_secs(),
                        cooldown_s = alert.cooldown_seconds,
                        "alert in cooldown"
                    );
                    return;
                }
            }

            alert.last_triggered = Some(now);
            alert.trigger_count += 1;
            alert.clone()
        };

        info!(
            target = "faro::alerts",
            alert = %snapshot.name,
            event_type = %event.event_type,
            severity = %event.severity,
            "alert triggered"
        );
        self.queue.push(DeliveryJob {
            alert: snapshot,
            event: event.clone(),
        });
    }
}

/// Owns alert configurations and their event-stream subscriptions, and runs
/// the delivery worker.
pub struct AlertEngine {
    stream: Arc<EventStream>,
    inner: Arc<EngineInner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AlertEngine {
    /// Engine bound to `stream`; spawns the delivery worker immediately.
    #[must_use]
    pub fn new(stream: Arc<EventStream>, config: AlertEngineConfig) -> Self {
        let capacity = if config.queue_capacity == 0 {
            256
        } else {
            config.queue_capacity
        };
        let inner = Arc::new(EngineInner {
            alerts: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            queue: DeliveryQueue::new(capacity, config.overflow),
            config,
        });

        let worker = tokio::spawn(run_worker(Arc::clone(&inner)));
        info!(target = "faro::alerts", "alert engine started");

        Self {
            stream,
            inner,
            worker: Mutex::new(Some(worker)),
        }
    }

    fn subscribe_alert(&self, config: &AlertConfig) -> Result<(), FaroError> {
        let inner = Arc::clone(&self.inner);
        let alert_id = config.alert_id.clone();
        let subscription_id = self.stream.subscribe(
            Arc::new(move |event: &WatchdogEvent| inner.handle_event(&alert_id, event)),
            config.trigger.event_filter.clone(),
            None,
        )?;
        self.inner
            .subscriptions
            .lock()
            .expect("subscription mutex poisoned")
            .insert(config.alert_id.clone(), subscription_id);
        Ok(())
    }

    fn unsubscribe_alert(&self, alert_id: &str) {
        let subscription = self
            .inner
            .subscriptions
            .lock()
            .expect("subscription mutex poisoned")
            .remove(alert_id);
        if let Some(id) = subscription {
            self.stream.unsubscribe(&id);
        }
    }

    fn inject_defaults(&self, config: &mut AlertConfig) {
        if config.delivery_methods.contains(&DeliveryMethod::Email) && config.email_config.is_none()
        {
            config.email_config = self.inner.config.default_email.clone();
        }
        if config.delivery_methods.contains(&DeliveryMethod::Telegram)
            && config.telegram_config.is_none()
        {
            config.telegram_config = self.inner.config.default_telegram.clone();
        }
    }

    /// Create an alert and subscribe it to the stream.
    ///
    /// # Errors
    /// `InvalidArg` when the id is already taken.
    pub fn create_alert(&self, mut config: AlertConfig) -> Result<AlertConfig, FaroError> {
        {
            let alerts = self.inner.alerts.lock().expect("alert mutex poisoned");
            if alerts.contains_key(&config.alert_id) {
                return Err(FaroError::InvalidArg(format!(
                    "alert with id '{}' already exists",
                    config.alert_id
                )));
            }
        }

        self.inject_defaults(&mut config);
        self.subscribe_alert(&config)?;
        self.inner
            .alerts
            .lock()
            .expect("alert mutex poisoned")
            .insert(config.alert_id.clone(), config.clone());

        info!(target = "faro::alerts", alert = %config.name, id = %config.alert_id, "created alert");
        Ok(config)
    }

    /// Replace an alert's configuration, resubscribing its filter.
    ///
    /// # Errors
    /// `NotFound` when the id is unknown.
    pub fn update_alert(
        &self,
        alert_id: &str,
        mut config: AlertConfig,
    ) -> Result<AlertConfig, FaroError> {
        {
            let alerts = self.inner.alerts.lock().expect("alert mutex poisoned");
            if !alerts.contains_key(alert_id) {
                return Err(FaroError::not_found(format!("alert {alert_id}")));
            }
        }

        self.unsubscribe_alert(alert_id);
        config.alert_id = alert_id.to_string();
        config.updated_at = Utc::now();
        self.inject_defaults(&mut config);
        if config.enabled {
            self.subscribe_alert(&config)?;
        }
        self.inner
            .alerts
            .lock()
            .expect("alert mutex poisoned")
            .insert(alert_id.to_string(), config.clone());

        info!(target = "faro::alerts", alert = %config.name, id = %alert_id, "updated alert");
        Ok(config)
    }

    /// Delete an alert; `true` when it existed.
    pub fn delete_alert(&self, alert_id: &str) -> bool {
        self.unsubscribe_alert(alert_id);
        let removed = self
            .inner
            .alerts
            .lock()
            .expect("alert mutex poisoned")
            .remove(alert_id)
            .is_some();
        if removed {
            info!(target = "faro::alerts", id = %alert_id, "deleted alert");
        }
        removed
    }

    /// Current configuration (including trigger stats) for one alert.
    #[must_use]
    pub fn get_alert(&self, alert_id: &str) -> Option<AlertConfig> {
        self.inner
            .alerts
            .lock()
            .expect("alert mutex poisoned")
            .get(alert_id)
            .cloned()
    }

    /// All alerts, optionally only enabled ones.
    #[must_use]
    pub fn list_alerts(&self, enabled_only: bool) -> Vec<AlertConfig> {
        let alerts = self.inner.alerts.lock().expect("alert mutex poisoned");
        let mut out: Vec<AlertConfig> = alerts
            .values()
            .filter(|a| !enabled_only || a.enabled)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));
        out
    }

    /// Enable an alert; `true` when it exists.
    pub fn enable_alert(&self, alert_id: &str) -> bool {
        self.set_enabled(alert_id, true)
    }

    /// Disable an alert; its subscription stays but deliveries stop.
    pub fn disable_alert(&self, alert_id: &str) -> bool {
        self.set_enabled(alert_id, false)
    }

    fn set_enabled(&self, alert_id: &str, enabled: bool) -> bool {
        let mut alerts = self.inner.alerts.lock().expect("alert mutex poisoned");
        match alerts.get_mut(alert_id) {
            Some(alert) => {
                alert.enabled = enabled;
                alert.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Stop the delivery worker and drop every subscription.
    pub async fn shutdown(&self) {
        let alert_ids: Vec<String> = {
            let subscriptions = self
                .inner
                .subscriptions
                .lock()
                .expect("subscription mutex poisoned");
            subscriptions.keys().cloned().collect()
        };
        for id in alert_ids {
            self.unsubscribe_alert(&id);
        }

        self.inner.queue.close();
        let worker = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
        info!(target = "faro::alerts", "alert engine stopped");
    }
}

async fn run_worker(inner: Arc<EngineInner>) {
    let client = reqwest::Client::new();
    let telegram_base = inner
        .config
        .telegram_api_base
        .clone()
        .unwrap_or_else(|| "https://api.telegram.org".to_string());

    while let Some(job) = inner.queue.pop().await {
        let DeliveryJob { alert, event } = job;
        let mut deliveries = Vec::new();

        for method in &alert.delivery_methods {
            match method {
                DeliveryMethod::Email => {
                    if let Some(email) = alert.email_config.clone() {
                        let alert = alert.clone();
                        let event = event.clone();
                        deliveries.push(tokio::spawn(async move {
                            ("email", delivery::send_email(&email, &alert, &event).await)
                        }));
                    }
                }
                DeliveryMethod::Telegram => {
                    if let Some(telegram) = alert.telegram_config.clone() {
                        let alert = alert.clone();
                        let event = event.clone();
                        let client = client.clone();
                        let base = telegram_base.clone();
                        deliveries.push(tokio::spawn(async move {
                            (
                                "telegram",
                                delivery::send_telegram(&client, &telegram, &alert, &event, &base)
                                    .await,
                            )
                        }));
                    }
                }
                DeliveryMethod::Webhook => {
                    if let Some(webhook) = alert.webhook_config.clone() {
                        let alert = alert.clone();
                        let event = event.clone();
                        let client = client.clone();
                        deliveries.push(tokio::spawn(async move {
                            (
                                "webhook",
                                delivery::send_webhook(&client, &webhook, &alert, &event).await,
                            )
                        }));
                    }
                }
            }
        }

        for joined in join_all(deliveries).await {
            match joined {
                Ok((channel, Err(e))) => {
                    error!(
                        target = "faro::alerts",
                        alert = %alert.name,
                        channel,
                        error = %e,
                        "delivery failed"
                    );
                }
                Ok((_, Ok(()))) => {}
                Err(e) => {
                    error!(
                        target = "faro::alerts",
                        alert = %alert.name,
                        error = %e,
                        "delivery task panicked"
                    );
                }
            }
        }
    }
}
