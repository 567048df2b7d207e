use std::{env, time::Duration};

use crate::services::price_feed::PriceSource;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub log_filter: String,

    // "simulated" | "live"
    pub price_source: PriceSource,
    pub sim_tick: Duration,
    pub notification_ttl: Duration,

    pub binance_ws_url: String,
    pub feed_max_backoff: Duration,

    pub coingecko_url: String,
    pub coincap_url: String,
    // serve the built-in catalog instead of calling the providers
    pub market_offline: bool,

    pub gemini_api_key: String,
    pub gemini_model: String,
}

fn env_millis(key: &str, default_ms: u64) -> Duration {
    let ms = env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let price_source = env::var("PRICE_SOURCE")
        .ok()
        .and_then(|s| s.parse::<PriceSource>().ok())
        .unwrap_or(PriceSource::Simulated);

    let binance_ws_url = env::var("BINANCE_WS_URL")
        .unwrap_or_else(|_| "wss://stream.binance.com:9443/ws/!miniTicker@arr".to_string());

    let coingecko_url = env::var("COINGECKO_URL")
        .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());
    let coincap_url =
        env::var("COINCAP_URL").unwrap_or_else(|_| "https://api.coincap.io/v2".to_string());

    let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
    let gemini_model =
        env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

    Settings {
        host,
        port,
        log_filter,
        price_source,
        sim_tick: env_millis("SIM_TICK_MS", 3_000),
        notification_ttl: env_millis("NOTIFICATION_TTL_MS", 5_000),
        binance_ws_url,
        feed_max_backoff: env_millis("FEED_MAX_BACKOFF_MS", 30_000),
        coingecko_url,
        coincap_url,
        market_offline: env_flag("MARKET_OFFLINE"),
        gemini_api_key,
        gemini_model,
    }
}
