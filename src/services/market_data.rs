use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::AppError,
    models::{Asset, GlobalStats},
};

const LISTING_SIZE: &str = "50";

/// Listing plus aggregate stats, as shown by every page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketSnapshot {
    pub assets: Vec<Asset>,
    pub stats: Option<GlobalStats>,
    // false until both startup requests have completed
    pub loaded: bool,
}

impl MarketSnapshot {
    pub fn find(&self, asset_id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == asset_id)
    }
}

#[derive(Clone)]
pub struct MarketDataClient {
    http: Client,
    coingecko_url: String,
    coincap_url: String,
    offline: bool,
}

impl MarketDataClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            coingecko_url: settings.coingecko_url.trim_end_matches('/').to_string(),
            coincap_url: settings.coincap_url.trim_end_matches('/').to_string(),
            offline: settings.market_offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Request listing and stats concurrently; resolves once both are in.
    pub async fn load(&self) -> MarketSnapshot {
        let (assets, stats) = tokio::join!(self.fetch_listing(), self.fetch_global_stats());
        MarketSnapshot {
            assets,
            stats: Some(stats),
            loaded: true,
        }
    }

    /// CoinGecko first, CoinCap second, empty list if both fail.
    pub async fn fetch_listing(&self) -> Vec<Asset> {
        if self.offline {
            return builtin_catalog();
        }

        match self.coingecko_markets().await {
            Ok(assets) => return assets,
            Err(err) => tracing::warn!("CoinGecko listing failed, falling back to CoinCap: {}", err),
        }

        match self.coincap_assets().await {
            Ok(assets) => assets,
            Err(err) => {
                tracing::error!("All market data sources failed: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn fetch_global_stats(&self) -> GlobalStats {
        if self.offline {
            return GlobalStats::fallback();
        }

        match self.coingecko_global().await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!("global stats unavailable, using fallback: {}", err);
                GlobalStats::fallback()
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let res = self.http.get(url).query(query).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Upstream { status, body });
        }

        Ok(res.json::<T>().await?)
    }

    async fn coingecko_markets(&self) -> Result<Vec<Asset>, AppError> {
        let url = format!("{}/coins/markets", self.coingecko_url);
        let items: Vec<CoinGeckoMarket> = self
            .get_json(
                &url,
                &[
                    ("vs_currency", "usd"),
                    ("order", "market_cap_desc"),
                    ("per_page", LISTING_SIZE),
                    ("page", "1"),
                    ("sparkline", "false"),
                ],
            )
            .await?;

        Ok(items.into_iter().filter_map(CoinGeckoMarket::into_asset).collect())
    }

    async fn coincap_assets(&self) -> Result<Vec<Asset>, AppError> {
        let url = format!("{}/assets", self.coincap_url);
        let body: CoinCapResponse = self.get_json(&url, &[("limit", LISTING_SIZE)]).await?;

        Ok(body.data.into_iter().filter_map(CoinCapAsset::into_asset).collect())
    }

    async fn coingecko_global(&self) -> Result<GlobalStats, AppError> {
        let url = format!("{}/global", self.coingecko_url);
        let body: CoinGeckoGlobalResponse = self.get_json(&url, &[]).await?;
        Ok(body.into_stats())
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinGeckoMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub total_volume: Option<f64>,
    pub market_cap: Option<f64>,
}

impl CoinGeckoMarket {
    pub fn into_asset(self) -> Option<Asset> {
        let price = self.current_price.filter(|p| p.is_finite())?;
        Some(Asset {
            id: self.id,
            symbol: self.symbol.to_uppercase(),
            name: self.name,
            price,
            change_24h: self.price_change_percentage_24h.unwrap_or(0.0),
            volume_24h: self.total_volume.unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            category: "Top Assets".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinCapResponse {
    pub data: Vec<CoinCapAsset>,
}

// CoinCap sends every number as a string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinCapAsset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price_usd: Option<String>,
    pub change_percent24_hr: Option<String>,
    pub volume_usd24_hr: Option<String>,
    pub market_cap_usd: Option<String>,
}

fn parse_num(s: Option<&str>) -> Option<f64> {
    s.and_then(|v| v.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
}

impl CoinCapAsset {
    pub fn into_asset(self) -> Option<Asset> {
        let price = parse_num(self.price_usd.as_deref())?;
        Some(Asset {
            id: self.id,
            symbol: self.symbol.to_uppercase(),
            name: self.name,
            price,
            change_24h: parse_num(self.change_percent24_hr.as_deref()).unwrap_or(0.0),
            volume_24h: parse_num(self.volume_usd24_hr.as_deref()).unwrap_or(0.0),
            market_cap: parse_num(self.market_cap_usd.as_deref()).unwrap_or(0.0),
            category: "Market Assets".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinGeckoGlobalResponse {
    pub data: CoinGeckoGlobal,
}

#[derive(Debug, Deserialize)]
pub struct CoinGeckoGlobal {
    pub total_market_cap: HashMap<String, f64>,
    pub total_volume: HashMap<String, f64>,
    pub market_cap_percentage: HashMap<String, f64>,
    pub active_cryptocurrencies: u64,
}

impl CoinGeckoGlobalResponse {
    pub fn into_stats(self) -> GlobalStats {
        let d = self.data;
        GlobalStats {
            total_market_cap: d.total_market_cap.get("usd").copied().unwrap_or(0.0),
            total_volume: d.total_volume.get("usd").copied().unwrap_or(0.0),
            btc_dominance: d.market_cap_percentage.get("btc").copied().unwrap_or(0.0),
            active_cryptos: d.active_cryptocurrencies,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn asset(
    id: &str,
    symbol: &str,
    name: &str,
    price: f64,
    change_24h: f64,
    volume_24h: f64,
    market_cap: f64,
    category: &str,
) -> Asset {
    Asset {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change_24h,
        volume_24h,
        market_cap,
        category: category.to_string(),
    }
}

/// Eight well-known assets used in offline mode and in tests.
pub fn builtin_catalog() -> Vec<Asset> {
    vec![
        asset("bitcoin", "BTC", "Bitcoin", 68420.50, 2.45, 35e9, 1.35e12, "Layer 1"),
        asset("ethereum", "ETH", "Ethereum", 2642.12, -1.12, 15e9, 310e9, "Layer 1"),
        asset("solana", "SOL", "Solana", 145.88, 5.67, 4.2e9, 68e9, "Layer 1"),
        asset("cardano", "ADA", "Cardano", 0.354, 0.23, 350e6, 12.5e9, "Layer 1"),
        asset("ripple", "XRP", "Ripple", 0.542, -0.45, 1.2e9, 30e9, "Payment"),
        asset("polkadot", "DOT", "Polkadot", 4.12, 1.55, 180e6, 6e9, "Layer 0"),
        asset("chainlink", "LINK", "Chainlink", 11.23, 3.21, 450e6, 7e9, "Oracle"),
        asset("dogecoin", "DOGE", "Dogecoin", 0.124, 8.92, 2.1e9, 18e9, "Meme"),
    ]
}
