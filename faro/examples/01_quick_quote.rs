//! Minimal end-to-end lookup against the deterministic mock provider.
//!
//! Run with: `cargo run --example 01_quick_quote`

use std::sync::Arc;

use faro::{Faro, SymbolQuery};
use faro_mock::MockProvider;
use faro_types::{AnalysisDepth, ProviderConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = ProviderConfig::named("mock");
    config.priority = 9;

    let faro = Faro::builder()
        .with_provider(config, Arc::new(MockProvider::new()))
        .build()
        .await?;

    let report = faro
        .search_by_symbol(SymbolQuery::new("AAPL").depth(AnalysisDepth::Quick))
        .await;

    println!(
        "{}: ${:.2} ({:+.2}%) via {} [ttl {}s, confidence {:.2}]",
        report.symbol,
        report.cached.price,
        report.cached.change_percent,
        report.cached.source,
        report.cached.ttl,
        report.cached.confidence,
    );
    println!(
        "lineage: {:?} (score {:.1})",
        report.data_lineage.providers_consulted, report.data_lineage.arbitration_score
    );
    println!("task: {} ({:?})", report.task.id, report.task.status);

    faro.shutdown().await;
    Ok(())
}
