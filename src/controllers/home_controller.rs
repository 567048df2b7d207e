use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    format::{fmt_compact_usd, fmt_pct, fmt_price},
    render::{self, View},
    services::signals_service,
};

const TOP_GAINERS: usize = 8;

// GET /
pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let view = View::Dashboard;
    let snap = state.market();
    if !snap.loaded {
        return render::loading_response(&state, &headers, &view);
    }

    let prices = state.prices.snapshot();

    let mut gainers = snap.assets.clone();
    gainers.sort_by(|a, b| b.change_24h.total_cmp(&a.change_24h));
    gainers.truncate(TOP_GAINERS);

    let rows: Vec<serde_json::Value> = gainers
        .iter()
        .map(|a| {
            let price = prices.get(&a.id).copied().unwrap_or(a.price);
            json!({
                "id": a.id,
                "symbol": a.symbol,
                "name": a.name,
                "price": fmt_price(price),
                "change": fmt_pct(a.change_24h),
                "up": a.change_24h > 0.0,
                "volume": fmt_compact_usd(a.volume_24h),
                "market_cap": fmt_compact_usd(a.market_cap),
            })
        })
        .collect();

    let avg_change = if snap.assets.is_empty() {
        0.0
    } else {
        snap.assets.iter().map(|a| a.change_24h).sum::<f64>() / snap.assets.len() as f64
    };

    let stats = snap.stats.clone().unwrap_or_else(crate::models::GlobalStats::fallback);

    let signals: Vec<serde_json::Value> = signals_service::list_signals(&snap.assets)
        .into_iter()
        .map(|(a, s)| {
            json!({
                "id": a.id,
                "symbol": a.symbol,
                "kind": s.kind.label(),
                "score": s.score,
                "bullish": s.kind.is_bullish(),
            })
        })
        .collect();

    let ctx = json!({
        "stats": {
            "total_market_cap": fmt_compact_usd(stats.total_market_cap),
            "total_volume": fmt_compact_usd(stats.total_volume),
            "btc_dominance": format!("{:.1}%", stats.btc_dominance),
            "active_cryptos": stats.active_cryptos,
        },
        "avg_change": fmt_pct(avg_change),
        "asset_count": snap.assets.len(),
        "active_alerts": state.alerts.list_active().len(),
        "gainers": rows,
        "has_assets": !rows.is_empty(),
        "signals": signals,
    });

    render::page_response(&state, &headers, &view, "Dashboard", StatusCode::OK, "pages/dashboard", ctx)
}

pub async fn not_found(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render::page_response(
        &state,
        &headers,
        &View::Dashboard,
        "404",
        StatusCode::NOT_FOUND,
        "pages/not_found",
        json!({}),
    )
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}
