//! Lifecycle management for the detector fleet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faro_core::{FaroError, MarketReader};
use faro_types::{
    Asset, AssetKind, EventFilter, Severity, WatchdogConfig, WatchdogEvent, WatchdogHealth,
};
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::base::{Detector, Watchdog};
use crate::detectors::sources::{DepthSource, FundingRateSource, TransferFeed};
use crate::detectors::{
    CorrelationBreakdownDetector, EarningsAnomalyDetector, ExchangeOutageDetector,
    FundingRateDetector, LiquidityDropDetector, PriceAnomalyDetector, UnusualVolumeDetector,
    WhaleMovementDetector,
};
use crate::events::{EventCallback, EventStream, EventStreamStats};

/// Per-deployment tuning for the detector fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchdogSettings {
    /// Ring-buffer capacity of the event stream.
    pub max_history: usize,
    /// Equity symbols the market detectors watch.
    pub equity_symbols: Vec<String>,
    /// Crypto symbols the market detectors watch.
    pub crypto_symbols: Vec<String>,
    /// Symbol pairs the correlation detector tracks.
    pub correlation_pairs: Vec<(String, String)>,

    /// Earnings detector toggle.
    pub earnings_enabled: bool,
    /// Earnings check interval, seconds.
    pub earnings_interval_secs: u64,
    /// Earnings surprise threshold, percent.
    pub earnings_surprise_pct: f64,

    /// Volume detector toggle.
    pub volume_enabled: bool,
    /// Volume check interval, seconds.
    pub volume_interval_secs: u64,
    /// Volume spike multiplier.
    pub volume_multiplier: f64,

    /// Whale detector toggle.
    pub whale_enabled: bool,
    /// Whale check interval, seconds.
    pub whale_interval_secs: u64,
    /// Whale notional threshold, USD.
    pub whale_min_usd: f64,

    /// Funding detector toggle.
    pub funding_enabled: bool,
    /// Funding check interval, seconds.
    pub funding_interval_secs: u64,
    /// Funding rate threshold, fraction per 8h.
    pub funding_threshold: f64,

    /// Liquidity detector toggle.
    pub liquidity_enabled: bool,
    /// Liquidity check interval, seconds.
    pub liquidity_interval_secs: u64,
    /// Liquidity drop trigger ratio.
    pub liquidity_drop_ratio: f64,

    /// Correlation detector toggle.
    pub correlation_enabled: bool,
    /// Correlation check interval, seconds.
    pub correlation_interval_secs: u64,
    /// Correlation change threshold.
    pub correlation_threshold: f64,

    /// Outage detector toggle.
    pub outage_enabled: bool,
    /// Outage check interval, seconds.
    pub outage_interval_secs: u64,

    /// Price detector toggle.
    pub price_enabled: bool,
    /// Price check interval, seconds.
    pub price_interval_secs: u64,
    /// Price move threshold, percent.
    pub price_threshold_pct: f64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            max_history: 1_000,
            equity_symbols: ["AAPL", "MSFT", "GOOGL", "TSLA", "SPY", "QQQ"]
                .map(String::from)
                .to_vec(),
            crypto_symbols: ["BTC", "ETH", "SOL"].map(String::from).to_vec(),
            correlation_pairs: vec![
                ("BTC".into(), "ETH".into()),
                ("SPY".into(), "QQQ".into()),
                ("BTC".into(), "SPY".into()),
            ],
            earnings_enabled: true,
            earnings_interval_secs: 300,
            earnings_surprise_pct: 10.0,
            volume_enabled: true,
            volume_interval_secs: 60,
            volume_multiplier: 3.0,
            whale_enabled: true,
            whale_interval_secs: 120,
            whale_min_usd: 1_000_000.0,
            funding_enabled: true,
            funding_interval_secs: 300,
            funding_threshold: 0.001,
            liquidity_enabled: true,
            liquidity_interval_secs: 180,
            liquidity_drop_ratio: 0.5,
            correlation_enabled: true,
            correlation_interval_secs: 600,
            correlation_threshold: 0.5,
            outage_enabled: true,
            outage_interval_secs: 60,
            price_enabled: true,
            price_interval_secs: 30,
            price_threshold_pct: 5.0,
        }
    }
}

impl WatchdogSettings {
    fn asset(&self, symbol: &str) -> Option<Asset> {
        let kind = if self.crypto_symbols.iter().any(|s| s == symbol) {
            AssetKind::Crypto
        } else {
            AssetKind::Equity
        };
        Asset::new(symbol, kind).ok()
    }

    fn equity_assets(&self) -> Vec<Asset> {
        self.equity_symbols
            .iter()
            .filter_map(|s| Asset::new(s, AssetKind::Equity).ok())
            .collect()
    }

    fn crypto_assets(&self) -> Vec<Asset> {
        self.crypto_symbols
            .iter()
            .filter_map(|s| Asset::new(s, AssetKind::Crypto).ok())
            .collect()
    }

    fn all_assets(&self) -> Vec<Asset> {
        let mut assets = self.equity_assets();
        assets.extend(self.crypto_assets());
        assets
    }
}

/// Data sources the default fleet is wired from.
///
/// Detectors whose source is absent are skipped at registration; the fleet
/// degrades rather than failing startup.
pub struct DetectorSources {
    /// Arbitrated market read surface.
    pub reader: Arc<dyn MarketReader>,
    /// Funding rates, when a derivatives feed is configured.
    pub funding: Option<Arc<dyn FundingRateSource>>,
    /// Order-book depth, when a book feed is configured.
    pub depth: Option<Arc<dyn DepthSource>>,
    /// On-chain transfers, when a chain monitor is configured.
    pub transfers: Option<Arc<dyn TransferFeed>>,
}

impl DetectorSources {
    /// Sources backed only by the market reader.
    #[must_use]
    pub fn market_only(reader: Arc<dyn MarketReader>) -> Self {
        Self {
            reader,
            funding: None,
            depth: None,
            transfers: None,
        }
    }
}

/// Overall manager status rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerStatus {
    /// Whether `initialize` has completed.
    pub initialized: bool,
    /// Whether the fleet is started.
    pub running: bool,
    /// Registered watchdogs.
    pub total_watchdogs: usize,
    /// Enabled watchdogs.
    pub enabled_watchdogs: usize,
    /// Watchdogs with a live loop.
    pub running_watchdogs: usize,
    /// Healthy count.
    pub healthy: usize,
    /// Degraded count.
    pub degraded: usize,
    /// Unhealthy count.
    pub unhealthy: usize,
    /// Event stream statistics.
    pub event_stats: EventStreamStats,
}

/// Owns the detector fleet and wires it to the shared event stream.
pub struct WatchdogManager {
    stream: Arc<EventStream>,
    settings: WatchdogSettings,
    watchdogs: Mutex<HashMap<&'static str, Arc<Watchdog>>>,
    initialized: AtomicBool,
    running: AtomicBool,
}

impl WatchdogManager {
    /// Manager over an explicit stream; detectors are registered separately.
    #[must_use]
    pub fn new(stream: Arc<EventStream>, settings: WatchdogSettings) -> Self {
        Self {
            stream,
            settings,
            watchdogs: Mutex::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Manager with the standard eight-detector fleet registered from
    /// `sources` per the settings.
    #[must_use]
    pub fn with_default_fleet(
        stream: Arc<EventStream>,
        settings: WatchdogSettings,
        sources: &DetectorSources,
    ) -> Self {
        let manager = Self::new(stream, settings.clone());

        manager.register(
            Arc::new(
                EarningsAnomalyDetector::new(
                    Arc::clone(&sources.reader),
                    settings.equity_assets(),
                )
                .with_threshold(settings.earnings_surprise_pct),
            ),
            WatchdogConfig {
                check_interval_seconds: settings.earnings_interval_secs,
                enabled: settings.earnings_enabled,
                ..WatchdogConfig::default()
            },
        );

        manager.register(
            Arc::new(
                UnusualVolumeDetector::new(Arc::clone(&sources.reader), settings.all_assets())
                    .with_multiplier(settings.volume_multiplier),
            ),
            WatchdogConfig {
                check_interval_seconds: settings.volume_interval_secs,
                enabled: settings.volume_enabled,
                ..WatchdogConfig::default()
            },
        );

        if let Some(transfers) = &sources.transfers {
            manager.register(
                Arc::new(
                    WhaleMovementDetector::new(Arc::clone(transfers))
                        .with_threshold(settings.whale_min_usd),
                ),
                WatchdogConfig {
                    check_interval_seconds: settings.whale_interval_secs,
                    enabled: settings.whale_enabled,
                    ..WatchdogConfig::default()
                },
            );
        }

        if let Some(funding) = &sources.funding {
            manager.register(
                Arc::new(
                    FundingRateDetector::new(Arc::clone(funding), settings.crypto_assets())
                        .with_threshold(settings.funding_threshold),
                ),
                WatchdogConfig {
                    check_interval_seconds: settings.funding_interval_secs,
                    enabled: settings.funding_enabled,
                    ..WatchdogConfig::default()
                },
            );
        }

        if let Some(depth) = &sources.depth {
            manager.register(
                Arc::new(
                    LiquidityDropDetector::new(Arc::clone(depth), settings.all_assets())
                        .with_drop_ratio(settings.liquidity_drop_ratio),
                ),
                WatchdogConfig {
                    check_interval_seconds: settings.liquidity_interval_secs,
                    enabled: settings.liquidity_enabled,
                    ..WatchdogConfig::default()
                },
            );
        }

        let pairs: Vec<(Asset, Asset)> = settings
            .correlation_pairs
            .iter()
            .filter_map(|(a, b)| Some((settings.asset(a)?, settings.asset(b)?)))
            .collect();
        manager.register(
            Arc::new(
                CorrelationBreakdownDetector::new(Arc::clone(&sources.reader), pairs)
                    .with_threshold(settings.correlation_threshold),
            ),
            WatchdogConfig {
                check_interval_seconds: settings.correlation_interval_secs,
                enabled: settings.correlation_enabled,
                ..WatchdogConfig::default()
            },
        );

        manager.register(
            Arc::new(ExchangeOutageDetector::new(
                ExchangeOutageDetector::default_endpoints(),
            )),
            WatchdogConfig {
                check_interval_seconds: settings.outage_interval_secs,
                enabled: settings.outage_enabled,
                ..WatchdogConfig::default()
            },
        );

        manager.register(
            Arc::new(
                PriceAnomalyDetector::new(Arc::clone(&sources.reader), settings.all_assets())
                    .with_threshold(settings.price_threshold_pct),
            ),
            WatchdogConfig {
                check_interval_seconds: settings.price_interval_secs,
                enabled: settings.price_enabled,
                ..WatchdogConfig::default()
            },
        );

        manager
    }

    /// Register one detector under its loop configuration.
    pub fn register(&self, detector: Arc<dyn Detector>, config: WatchdogConfig) {
        let name = detector.name();
        let watchdog = Arc::new(Watchdog::new(detector, config));
        let mut watchdogs = self.watchdogs.lock().expect("watchdog mutex poisoned");
        if watchdogs.insert(name, watchdog).is_some() {
            warn!(
                target = "faro::watchdog::manager",
                watchdog = name,
                "replaced an already-registered watchdog"
            );
        } else {
            info!(target = "faro::watchdog::manager", watchdog = name, "registered watchdog");
        }
    }

    /// The shared event stream.
    #[must_use]
    pub fn event_stream(&self) -> Arc<EventStream> {
        Arc::clone(&self.stream)
    }

    /// Install the default critical/high priority subscribers.
    pub fn initialize(&self) -> Result<(), FaroError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!(target = "faro::watchdog::manager", "manager already initialized");
            return Ok(());
        }

        self.stream.subscribe(
            Arc::new(|event: &WatchdogEvent| {
                error!(
                    target = "faro::watchdog::manager",
                    event_type = %event.event_type,
                    asset = event.symbol().unwrap_or("n/a"),
                    description = %event.description,
                    "CRITICAL EVENT"
                );
            }),
            Some(EventFilter::match_all().with_severities([Severity::Critical])),
            Some("manager_critical".to_string()),
        )?;

        self.stream.subscribe(
            Arc::new(|event: &WatchdogEvent| {
                warn!(
                    target = "faro::watchdog::manager",
                    event_type = %event.event_type,
                    asset = event.symbol().unwrap_or("n/a"),
                    description = %event.description,
                    "high priority event"
                );
            }),
            Some(EventFilter::match_all().with_severities([Severity::High])),
            Some("manager_high".to_string()),
        )?;

        let count = self.watchdogs.lock().expect("watchdog mutex poisoned").len();
        info!(
            target = "faro::watchdog::manager",
            watchdogs = count,
            "watchdog manager initialized"
        );
        Ok(())
    }

    /// Hook invoked on critical events, in addition to the default logger.
    pub fn on_critical(&self, callback: EventCallback) -> Result<String, FaroError> {
        self.stream.subscribe(
            callback,
            Some(EventFilter::match_all().with_severities([Severity::Critical])),
            None,
        )
    }

    fn snapshot(&self) -> Vec<Arc<Watchdog>> {
        self.watchdogs
            .lock()
            .expect("watchdog mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Concurrently start every enabled watchdog.
    pub async fn start(&self) {
        if !self.initialized.load(Ordering::SeqCst) {
            let _ = self.initialize();
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(target = "faro::watchdog::manager", "manager already running");
            return;
        }

        let watchdogs = self.snapshot();
        let stream = Arc::clone(&self.stream);
        join_all(
            watchdogs
                .iter()
                .filter(|w| w.is_enabled())
                .map(|w| w.start(Arc::clone(&stream))),
        )
        .await;
        info!(
            target = "faro::watchdog::manager",
            started = watchdogs.iter().filter(|w| w.is_running()).count(),
            "watchdog manager started"
        );
    }

    /// Stop every watchdog in parallel, then shut the stream down.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let watchdogs = self.snapshot();
        join_all(watchdogs.iter().map(|w| w.stop())).await;
        self.stream.shutdown();
        info!(target = "faro::watchdog::manager", "watchdog manager stopped");
    }

    /// Restart one watchdog; `false` when unknown.
    pub async fn restart(&self, name: &str) -> bool {
        let Some(watchdog) = self.get(name) else {
            error!(target = "faro::watchdog::manager", watchdog = name, "watchdog not found");
            return false;
        };
        info!(target = "faro::watchdog::manager", watchdog = name, "restarting watchdog");
        watchdog.stop().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        watchdog.start(Arc::clone(&self.stream)).await;
        true
    }

    /// Enable a watchdog, starting it when the manager is running.
    pub async fn enable(&self, name: &str) -> bool {
        let Some(watchdog) = self.get(name) else {
            return false;
        };
        watchdog.set_enabled(true);
        if self.running.load(Ordering::SeqCst) {
            watchdog.start(Arc::clone(&self.stream)).await;
        }
        true
    }

    /// Disable and stop a watchdog.
    pub async fn disable(&self, name: &str) -> bool {
        let Some(watchdog) = self.get(name) else {
            return false;
        };
        watchdog.set_enabled(false);
        watchdog.stop().await;
        true
    }

    fn get(&self, name: &str) -> Option<Arc<Watchdog>> {
        self.watchdogs
            .lock()
            .expect("watchdog mutex poisoned")
            .get(name)
            .cloned()
    }

    /// Registered watchdog names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        self.watchdogs
            .lock()
            .expect("watchdog mutex poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Health of every watchdog, keyed by name.
    #[must_use]
    pub fn get_health(&self) -> HashMap<String, WatchdogHealth> {
        self.snapshot()
            .into_iter()
            .map(|w| (w.name().to_string(), w.get_health()))
            .collect()
    }

    /// Overall status rollup.
    #[must_use]
    pub fn get_status(&self) -> ManagerStatus {
        let watchdogs = self.snapshot();
        let health = self.get_health();
        let count_status = |status: faro_types::WatchdogStatus| {
            health.values().filter(|h| h.status == status).count()
        };
        ManagerStatus {
            initialized: self.initialized.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            total_watchdogs: watchdogs.len(),
            enabled_watchdogs: watchdogs.iter().filter(|w| w.is_enabled()).count(),
            running_watchdogs: watchdogs.iter().filter(|w| w.is_running()).count(),
            healthy: count_status(faro_types::WatchdogStatus::Healthy),
            degraded: count_status(faro_types::WatchdogStatus::Degraded),
            unhealthy: count_status(faro_types::WatchdogStatus::Unhealthy),
            event_stats: self.stream.stats(),
        }
    }

    /// Recent events, passthrough to the stream.
    #[must_use]
    pub fn get_recent_events(
        &self,
        filter: Option<&EventFilter>,
        limit: usize,
    ) -> Vec<WatchdogEvent> {
        self.stream.get_history(filter, limit)
    }

    /// Subscribe to events, passthrough to the stream.
    pub fn subscribe(
        &self,
        callback: EventCallback,
        filter: Option<EventFilter>,
    ) -> Result<String, FaroError> {
        self.stream.subscribe(callback, filter, None)
    }

    /// Unsubscribe, passthrough to the stream.
    pub fn unsubscribe(&self, id: &str) -> bool {
        self.stream.unsubscribe(id)
    }

    /// The settings the fleet was built from.
    #[must_use]
    pub const fn settings(&self) -> &WatchdogSettings {
        &self.settings
    }
}
