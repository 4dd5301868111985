//! Run the detector fleet over the gateway's arbitrated read surface and
//! print every event the stream publishes.
//!
//! Run with: `cargo run --example 02_watchdog_fleet`

use std::sync::Arc;
use std::time::Duration;

use faro::Faro;
use faro_mock::MockProvider;
use faro_types::ProviderConfig;
use faro_watchdog::{DetectorSources, EventStream, WatchdogManager, WatchdogSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let faro = Faro::builder()
        .with_provider(ProviderConfig::named("mock"), Arc::new(MockProvider::new()))
        .build()
        .await?;

    let settings = WatchdogSettings {
        // Tight intervals so a short demo run produces checks.
        price_interval_secs: 2,
        volume_interval_secs: 3,
        outage_enabled: false, // no network probes in the demo
        ..WatchdogSettings::default()
    };
    let stream = Arc::new(EventStream::new(settings.max_history));
    let sources = DetectorSources::market_only(faro.market_reader());
    let manager = WatchdogManager::with_default_fleet(Arc::clone(&stream), settings, &sources);

    // Significant events evict the affected symbol from the cache.
    faro.attach_event_invalidation(&manager.event_stream())?;

    manager.subscribe(
        Arc::new(|event| {
            println!(
                "[{}] {} {}: {}",
                event.severity, event.watchdog, event.event_type, event.description
            );
        }),
        None,
    )?;

    manager.start().await;
    tokio::time::sleep(Duration::from_secs(8)).await;

    let status = manager.get_status();
    println!(
        "fleet: {} running / {} registered, {} events seen",
        status.running_watchdogs, status.total_watchdogs, status.event_stats.total_events
    );

    manager.stop().await;
    faro.shutdown().await;
    Ok(())
}
