//! Exchange health-endpoint probing.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::{EventType, Severity, WatchdogEvent};
use serde_json::json;
use tracing::warn;

use crate::base::Detector;

/// Budget fraction past which a slow-but-successful probe counts as
/// degradation.
const SLOW_FRACTION: f64 = 0.8;

/// Probes exchange health endpoints: non-200 is an incident, a timeout is
/// critical, and responses past 80% of the budget are degradation.
pub struct ExchangeOutageDetector {
    client: reqwest::Client,
    endpoints: Vec<(String, String)>,
    timeout: Duration,
}

impl ExchangeOutageDetector {
    /// Detector over `(exchange, health_url)` pairs with a 5 s budget.
    #[must_use]
    pub fn new(endpoints: Vec<(String, String)>) -> Self {
        Self::with_timeout(endpoints, Duration::from_secs(5))
    }

    /// Detector with an explicit per-probe budget.
    #[must_use]
    pub fn with_timeout(endpoints: Vec<(String, String)>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            timeout,
        }
    }

    /// The default public health endpoints.
    #[must_use]
    pub fn default_endpoints() -> Vec<(String, String)> {
        vec![
            (
                "binance".to_string(),
                "https://api.binance.com/api/v3/ping".to_string(),
            ),
            (
                "coinbase".to_string(),
                "https://api.coinbase.com/v2/time".to_string(),
            ),
            (
                "kraken".to_string(),
                "https://api.kraken.com/0/public/Time".to_string(),
            ),
        ]
    }
}

#[async_trait]
impl Detector for ExchangeOutageDetector {
    fn name(&self) -> &'static str {
        "exchange_outage"
    }

    async fn check(&self) -> Result<Option<WatchdogEvent>, FaroError> {
        for (exchange, url) in &self.endpoints {
            let started = Instant::now();
            let result = self
                .client
                .get(url.as_str())
                .timeout(self.timeout)
                .send()
                .await;
            let elapsed = started.elapsed();

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.as_u16() != 200 {
                        return Ok(Some(
                            WatchdogEvent::new(
                                EventType::ExchangeOutage,
                                Severity::High,
                                None,
                                format!("{exchange} is experiencing issues (HTTP {status})"),
                            )
                            .with_data("exchange", json!(exchange))
                            .with_data("status_code", json!(status.as_u16()))
                            .with_data("response_time_ms", json!(elapsed.as_millis() as u64)),
                        ));
                    }

                    if elapsed.as_secs_f64() > self.timeout.as_secs_f64() * SLOW_FRACTION {
                        return Ok(Some(
                            WatchdogEvent::new(
                                EventType::ExchangeOutage,
                                Severity::Medium,
                                None,
                                format!(
                                    "{exchange} is responding slowly ({:.1}s)",
                                    elapsed.as_secs_f64()
                                ),
                            )
                            .with_data("exchange", json!(exchange))
                            .with_data("response_time_ms", json!(elapsed.as_millis() as u64)),
                        ));
                    }
                }
                Err(e) if e.is_timeout() => {
                    return Ok(Some(
                        WatchdogEvent::new(
                            EventType::ExchangeOutage,
                            Severity::Critical,
                            None,
                            format!("{exchange} is not responding (timeout)"),
                        )
                        .with_data("exchange", json!(exchange))
                        .with_data("error", json!("timeout")),
                    ));
                }
                Err(e) => {
                    warn!(
                        target = "faro::watchdog::outage",
                        exchange = %exchange,
                        error = %e,
                        "health probe failed"
                    );
                }
            }
        }
        Ok(None)
    }
}
