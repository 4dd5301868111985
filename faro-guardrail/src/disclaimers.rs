//! Region- and asset-aware disclaimer generation.
//!
//! The region/asset table is pure data embedded at build time and parsed
//! once at startup; nothing here imports the rest of the pipeline, which
//! keeps the guardrail's dependency graph acyclic.

use std::collections::HashMap;

use faro_types::{AssetKind, Region};
use once_cell::sync::Lazy;

static TEMPLATES: Lazy<HashMap<String, HashMap<String, String>>> = Lazy::new(|| {
    serde_json::from_str(include_str!("data/disclaimers.json"))
        .expect("embedded disclaimer table must parse")
});

/// Generate appropriate disclaimers for a region and asset class.
///
/// Regions without a dedicated template fall back to the `GLOBAL` entries;
/// asset classes without a dedicated paragraph contribute nothing beyond the
/// general text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisclaimerBook;

impl DisclaimerBook {
    /// New book over the embedded template table.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn region_templates(region: Region) -> &'static HashMap<String, String> {
        TEMPLATES
            .get(region.as_str())
            .or_else(|| TEMPLATES.get(Region::Global.as_str()))
            .expect("GLOBAL disclaimer templates are embedded")
    }

    fn asset_fragment(region: Region, asset: AssetKind) -> Option<&'static str> {
        let key = asset.as_str();
        Self::region_templates(region)
            .get(key)
            .or_else(|| Self::region_templates(Region::Global).get(key))
            .map(String::as_str)
    }

    /// Disclaimer for one asset class.
    #[must_use]
    pub fn generate(&self, asset: AssetKind, region: Region, include_general: bool) -> String {
        let mut fragments: Vec<&str> = Vec::new();

        if include_general {
            let general = Self::region_templates(region)
                .get("general")
                .or_else(|| Self::region_templates(Region::Global).get("general"))
                .expect("general disclaimer present");
            fragments.push(general);
        }

        if let Some(asset_specific) = Self::asset_fragment(region, asset) {
            fragments.push(asset_specific);
        }

        fragments.join("\n\n")
    }

    /// Combined disclaimer for a response touching several asset classes.
    ///
    /// The general paragraph appears once; asset paragraphs are deduplicated.
    #[must_use]
    pub fn generate_multi_asset(&self, assets: &[AssetKind], region: Region) -> String {
        let mut fragments: Vec<&str> = Vec::new();

        let general = Self::region_templates(region)
            .get("general")
            .or_else(|| Self::region_templates(Region::Global).get("general"))
            .expect("general disclaimer present");
        fragments.push(general);

        for asset in assets {
            if let Some(asset_specific) = Self::asset_fragment(region, *asset)
                && !fragments.contains(&asset_specific)
            {
                fragments.push(asset_specific);
            }
        }

        fragments.join("\n\n")
    }

    /// Short inline risk warning for an asset class.
    #[must_use]
    pub fn risk_warning(&self, asset: AssetKind) -> &'static str {
        match asset {
            AssetKind::Equity | AssetKind::Etf => {
                "Investments can go down as well as up. You may lose money."
            }
            AssetKind::Crypto => {
                "High risk: cryptocurrencies are extremely volatile. You may lose everything."
            }
            AssetKind::Derivative => {
                "High risk: leveraged products can result in losses exceeding your investment."
            }
            AssetKind::Forex => "Forex trading carries substantial risk of loss.",
            AssetKind::Commodity => "Commodity investments are volatile and may result in losses.",
            AssetKind::Bond => "Investment involves risk.",
            _ => "Investment involves risk.",
        }
    }

    /// Compliance footer displayed under every response.
    #[must_use]
    pub fn compliance_footer(&self, region: Region) -> &'static str {
        match region {
            Region::Us => {
                "Faro is not a registered investment advisor, broker-dealer, or financial planner. \
                 We provide information, not advice."
            }
            Region::Eu => "Faro does not provide regulated investment services under MiFID II.",
            Region::Uk => "Faro is not authorized or regulated by the Financial Conduct Authority.",
            Region::Jp => {
                "Faroは金融商品取引業者ではありません。Faro is not a licensed financial \
                 instruments business operator."
            }
            _ => "Faro provides financial data and information only, not personalized advice.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_equity_contains_the_canonical_phrases() {
        let book = DisclaimerBook::new();
        let text = book.generate(AssetKind::Equity, Region::Us, true);
        assert!(text.contains("informational purposes only"));
        assert!(text.contains("Past performance"));
        assert!(text.contains("not a recommendation to buy or sell"));
    }

    #[test]
    fn unknown_regions_fall_back_to_global() {
        let book = DisclaimerBook::new();
        let text = book.generate(AssetKind::Crypto, Region::Sg, true);
        assert!(text.contains("informational and educational purposes only"));
        assert!(text.contains("Only invest what you can afford to lose"));
    }

    #[test]
    fn multi_asset_deduplicates_fragments() {
        let book = DisclaimerBook::new();
        let text = book.generate_multi_asset(
            &[AssetKind::Equity, AssetKind::Equity, AssetKind::Crypto],
            Region::Us,
        );
        assert_eq!(text.matches("This stock information").count(), 1);
        assert!(text.contains("Cryptocurrency trading"));
    }
}
