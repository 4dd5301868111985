//! Regulatory regions used by routing penalties and disclaimer selection.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Supported regions with distinct regulatory regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum Region {
    /// United States (SEC, FINRA).
    Us,
    /// European Union (MiFID II, ESMA).
    Eu,
    /// United Kingdom (FCA).
    Uk,
    /// Japan (JFSA).
    Jp,
    /// Australia (ASIC).
    Au,
    /// Canada (CSA).
    Ca,
    /// Singapore (MAS).
    Sg,
    /// Hong Kong (SFC).
    Hk,
    /// Default / international fallback.
    Global,
}

impl Region {
    /// Stable uppercase identifier matching the disclaimer table keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Eu => "EU",
            Self::Uk => "UK",
            Self::Jp => "JP",
            Self::Au => "AU",
            Self::Ca => "CA",
            Self::Sg => "SG",
            Self::Hk => "HK",
            Self::Global => "GLOBAL",
        }
    }

    /// Parse a region label, falling back to [`Region::Global`].
    #[must_use]
    pub fn parse_or_global(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "US" => Self::Us,
            "EU" => Self::Eu,
            "UK" => Self::Uk,
            "JP" => Self::Jp,
            "AU" => Self::Au,
            "CA" => Self::Ca,
            "SG" => Self::Sg,
            "HK" => Self::Hk,
            _ => Self::Global,
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::Global
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
