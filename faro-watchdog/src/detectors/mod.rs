//! The eight concrete detectors.
//!
//! Detectors that read market data go through [`MarketReader`]; crypto
//! infrastructure detectors (funding, depth, whale transfers) consume the
//! narrow source traits in [`sources`], and the exchange-outage detector
//! probes health endpoints directly.
//!
//! [`MarketReader`]: faro_core::MarketReader

mod correlation;
mod earnings;
mod funding;
mod liquidity;
mod outage;
mod price;
pub mod sources;
mod volume;
mod whale;

pub use correlation::CorrelationBreakdownDetector;
pub use earnings::EarningsAnomalyDetector;
pub use funding::FundingRateDetector;
pub use liquidity::LiquidityDropDetector;
pub use outage::ExchangeOutageDetector;
pub use price::PriceAnomalyDetector;
pub use volume::UnusualVolumeDetector;
pub use whale::WhaleMovementDetector;

use faro_core::ProviderResponse;
use serde_json::Value;

/// Extract one numeric field from each candle in an OHLCV payload.
pub(crate) fn candle_field(response: &ProviderResponse, field: &str) -> Vec<f64> {
    response
        .data
        .get("candles")
        .and_then(Value::as_array)
        .map(|candles| {
            candles
                .iter()
                .filter_map(|c| c.get(field).and_then(Value::as_f64))
                .collect()
        })
        .unwrap_or_default()
}
