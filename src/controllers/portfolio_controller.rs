use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde_json::json;

use crate::{
    AppState,
    format::{fmt_pct, fmt_price, fmt_usd},
    render::{self, View},
    services::portfolio_service,
};

// GET /portfolio
pub async fn get_portfolio_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let view = View::Portfolio;
    let snap = state.market();
    if !snap.loaded {
        return render::loading_response(&state, &headers, &view);
    }

    let summary = portfolio_service::demo_portfolio(&snap.assets, &state.prices.snapshot());

    let rows: Vec<serde_json::Value> = summary
        .holdings
        .iter()
        .map(|h| {
            json!({
                "id": h.asset.id,
                "symbol": h.asset.symbol,
                "name": h.asset.name,
                "amount": format!("{:.4}", h.amount),
                "avg_price": fmt_price(h.avg_price),
                "price": fmt_price(h.price),
                "value": fmt_usd(h.value),
                "pnl": fmt_usd(h.pnl),
                "pnl_pct": fmt_pct(h.pnl_pct),
                "up": h.pnl >= 0.0,
            })
        })
        .collect();

    let ctx = json!({
        "total_value": fmt_usd(summary.total_value),
        "total_cost": fmt_usd(summary.total_cost),
        "profit": fmt_usd(summary.profit),
        "pnl_pct": fmt_pct(summary.pnl_pct),
        "up": summary.profit >= 0.0,
        "holdings": rows,
        "has_holdings": !rows.is_empty(),
    });

    render::page_response(&state, &headers, &view, "Portfolio", StatusCode::OK, "pages/portfolio", ctx)
}
