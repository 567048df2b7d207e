use std::str::FromStr;

use serde::Serialize;

use crate::{
    models::{Asset, Indicators},
    services::{price_store::PriceMap, signals_service},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFilter {
    All,
    Breakouts,
    Oversold,
    Volume,
    Trend,
}

impl ScanFilter {
    pub const ALL: [ScanFilter; 5] = [
        ScanFilter::All,
        ScanFilter::Breakouts,
        ScanFilter::Oversold,
        ScanFilter::Volume,
        ScanFilter::Trend,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ScanFilter::All => "all",
            ScanFilter::Breakouts => "breakouts",
            ScanFilter::Oversold => "oversold",
            ScanFilter::Volume => "volume",
            ScanFilter::Trend => "trend",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScanFilter::All => "All Coins",
            ScanFilter::Breakouts => "Price Breakouts",
            ScanFilter::Oversold => "RSI Oversold",
            ScanFilter::Volume => "High Volume Spike",
            ScanFilter::Trend => "Trend Strength",
        }
    }

    fn matches(self, asset: &Asset, price: f64, ind: &Indicators) -> bool {
        match self {
            ScanFilter::All => true,
            ScanFilter::Breakouts => asset.change_24h >= 5.0,
            ScanFilter::Oversold => ind.rsi < 30.0,
            ScanFilter::Volume => asset.market_cap > 0.0 && asset.volume_24h >= asset.market_cap * 0.10,
            ScanFilter::Trend => ind.adx >= 25.0 && price > ind.ema50,
        }
    }
}

impl FromStr for ScanFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanFilter::ALL
            .into_iter()
            .find(|f| f.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scan filter: {s}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRow {
    pub asset: Asset,
    pub price: f64,
    pub indicators: Indicators,
}

/// Assets passing `filter` whose name or symbol contains `query`
/// (case-insensitive). Live prices win over listing prices.
pub fn scan(assets: &[Asset], prices: &PriceMap, filter: ScanFilter, query: &str) -> Vec<ScanRow> {
    let needle = query.trim().to_lowercase();

    assets
        .iter()
        .filter(|a| {
            needle.is_empty()
                || a.name.to_lowercase().contains(&needle)
                || a.symbol.to_lowercase().contains(&needle)
        })
        .filter_map(|a| {
            let price = prices.get(&a.id).copied().unwrap_or(a.price);
            let indicators = signals_service::indicators_for(a, price);
            filter.matches(a, price, &indicators).then(|| ScanRow {
                asset: a.clone(),
                price,
                indicators,
            })
        })
        .collect()
}
