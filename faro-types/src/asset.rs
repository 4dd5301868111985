//! Asset identity shared by every subsystem.

use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad asset classes the gateway understands.
///
/// The same set drives provider capability checks, cache TTL policy and
/// disclaimer selection, so a single enum is used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AssetKind {
    /// Listed common stock or depositary receipt.
    Equity,
    /// Cryptocurrency, bare (`BTC`) or pair form (`BTC/USDT`).
    Crypto,
    /// Currency pair.
    Forex,
    /// Physical or futures-referenced commodity.
    Commodity,
    /// Exchange traded fund.
    Etf,
    /// Government or corporate bond.
    Bond,
    /// Option, future, perpetual or other derivative contract.
    Derivative,
}

impl AssetKind {
    /// Stable, kebab-case identifier for logs and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Crypto => "crypto",
            Self::Forex => "forex",
            Self::Commodity => "commodity",
            Self::Etf => "etf",
            Self::Bond => "bond",
            Self::Derivative => "derivative",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while constructing an [`Asset`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The symbol was empty after trimming.
    #[error("empty symbol")]
    EmptySymbol,
}

/// A `(symbol, kind)` pair with optional market/exchange/currency hints.
///
/// Symbols are normalized (trimmed, ASCII-uppercased) at construction so the
/// rest of the system can compare and key on them directly. Crypto symbols
/// may carry a pair suffix (`BTC/USDT`); normalization against a concrete
/// quote currency happens at the provider boundary via [`Asset::pair_for`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Normalized symbol, e.g. `AAPL` or `BTC/USDT`.
    pub symbol: String,
    /// Asset class.
    pub kind: AssetKind,
    /// Optional market label (e.g. `US`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    /// Optional exchange label (e.g. `NASDAQ`, `kraken`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Optional quote currency (e.g. `USD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Asset {
    /// Build an asset from a raw symbol, normalizing it.
    ///
    /// # Errors
    /// Returns [`AssetError::EmptySymbol`] when the trimmed symbol is empty.
    pub fn new(symbol: impl AsRef<str>, kind: AssetKind) -> Result<Self, AssetError> {
        let normalized = symbol.as_ref().trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(AssetError::EmptySymbol);
        }
        Ok(Self {
            symbol: normalized,
            kind,
            market: None,
            exchange: None,
            currency: None,
        })
    }

    /// Builder-style market hint.
    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Builder-style exchange hint.
    #[must_use]
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Builder-style currency hint.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// The base leg of a pair-form symbol (`BTC` for `BTC/USDT`).
    ///
    /// Non-pair symbols are returned unchanged.
    #[must_use]
    pub fn base_symbol(&self) -> &str {
        self.symbol.split('/').next().unwrap_or(&self.symbol)
    }

    /// Pair form against an explicit quote currency.
    ///
    /// Symbols already in pair form keep their own quote leg.
    #[must_use]
    pub fn pair_for(&self, quote: &str) -> String {
        if self.symbol.contains('/') {
            self.symbol.clone()
        } else {
            format!("{}/{}", self.symbol, quote.trim().to_ascii_uppercase())
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_normalized() {
        let asset = Asset::new("  aapl ", AssetKind::Equity).unwrap();
        assert_eq!(asset.symbol, "AAPL");
    }

    #[test]
    fn empty_symbol_is_rejected() {
        assert_eq!(
            Asset::new("   ", AssetKind::Equity),
            Err(AssetError::EmptySymbol)
        );
    }

    #[test]
    fn pair_handling() {
        let bare = Asset::new("btc", AssetKind::Crypto).unwrap();
        assert_eq!(bare.pair_for("usdt"), "BTC/USDT");
        assert_eq!(bare.base_symbol(), "BTC");

        let pair = Asset::new("eth/usdc", AssetKind::Crypto).unwrap();
        assert_eq!(pair.pair_for("USDT"), "ETH/USDC");
        assert_eq!(pair.base_symbol(), "ETH");
    }
}
