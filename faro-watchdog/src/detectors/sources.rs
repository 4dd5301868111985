//! Narrow data-source contracts for detectors whose feeds sit outside the
//! provider registry (derivatives venues, order books, on-chain monitors).

use std::collections::HashMap;

use async_trait::async_trait;
use faro_core::FaroError;
use faro_types::Asset;

/// Perpetual funding rates by exchange, as 8h-period fractions
/// (`0.001 == 0.1%`).
#[async_trait]
pub trait FundingRateSource: Send + Sync {
    /// Current funding rates for `asset`, keyed by exchange id.
    async fn funding_rates(&self, asset: &Asset) -> Result<HashMap<String, f64>, FaroError>;
}

/// Order-book depth observations.
#[async_trait]
pub trait DepthSource: Send + Sync {
    /// Current two-sided depth near the touch, in quote units.
    async fn order_book_depth(&self, asset: &Asset) -> Result<f64, FaroError>;

    /// Rolling average depth over the past `days`.
    async fn average_depth(&self, asset: &Asset, days: u32) -> Result<f64, FaroError>;
}

/// One observed on-chain transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    /// Transferred asset.
    pub asset: Asset,
    /// Notional value in USD.
    pub amount_usd: f64,
    /// Source label (address or venue tag).
    pub from: String,
    /// Destination label.
    pub to: String,
    /// Chain transaction id.
    pub tx_id: String,
}

/// Feed of recent large transfers from a chain monitor.
#[async_trait]
pub trait TransferFeed: Send + Sync {
    /// Transfers observed since the previous poll.
    async fn recent_transfers(&self) -> Result<Vec<TokenTransfer>, FaroError>;
}
