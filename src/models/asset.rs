use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub btc_dominance: f64,
    pub active_cryptos: u64,
}

impl GlobalStats {
    /// Figures shown when the stats endpoint is unreachable.
    pub fn fallback() -> Self {
        Self {
            total_market_cap: 2_450_000_000_000.0,
            total_volume: 84_200_000_000.0,
            btc_dominance: 54.2,
            active_cryptos: 12_000,
        }
    }
}
