use std::sync::LazyLock;

use regex::Regex;

pub mod alerts_controller;
pub mod home_controller;
pub mod market_controller;
pub mod notifications_controller;
pub mod portfolio_controller;
pub mod realtime_controller;

// provider ids look like "bitcoin", "usd-coin", "wrapped-bitcoin"
static ASSET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.\-]{0,63}$").unwrap());

pub fn valid_asset_id(id: &str) -> bool {
    ASSET_ID_RE.is_match(id)
}
