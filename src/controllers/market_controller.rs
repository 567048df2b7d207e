use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    controllers::{home_controller, valid_asset_id},
    format::{fmt2, fmt_compact_usd, fmt_pct, fmt_price},
    models::Timeframe,
    render::{self, View},
    services::{
        chart_widget,
        scanner_service::{self, ScanFilter},
        signals_service,
    },
};

#[derive(Deserialize, Default)]
pub struct ScannerQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

// GET /scanner?filter=oversold&q=sol
pub async fn get_scanner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ScannerQuery>,
) -> Response {
    let view = View::Scanner;
    let snap = state.market();
    if !snap.loaded {
        return render::loading_response(&state, &headers, &view);
    }

    let filter = query
        .filter
        .as_deref()
        .and_then(|f| f.parse::<ScanFilter>().ok())
        .unwrap_or(ScanFilter::All);
    let q = query.q.unwrap_or_default();

    let rows: Vec<serde_json::Value> =
        scanner_service::scan(&snap.assets, &state.prices.snapshot(), filter, &q)
            .into_iter()
            .map(|r| {
                json!({
                    "id": r.asset.id,
                    "symbol": r.asset.symbol,
                    "name": r.asset.name,
                    "category": r.asset.category,
                    "price": fmt_price(r.price),
                    "change": fmt_pct(r.asset.change_24h),
                    "up": r.asset.change_24h > 0.0,
                    "volume": fmt_compact_usd(r.asset.volume_24h),
                    "rsi": format!("{:.0}", r.indicators.rsi),
                    "rsi_hot": r.indicators.rsi > 70.0,
                    "rsi_cold": r.indicators.rsi < 30.0,
                    "adx": format!("{:.0}", r.indicators.adx),
                })
            })
            .collect();

    let filters: Vec<serde_json::Value> = ScanFilter::ALL
        .into_iter()
        .map(|f| json!({ "id": f.id(), "label": f.label(), "active": f == filter }))
        .collect();

    let ctx = json!({
        "filters": filters,
        "filter": filter.id(),
        "query": q,
        "rows": rows,
        "has_rows": !rows.is_empty(),
    });

    render::page_response(&state, &headers, &view, "Market Scanner", StatusCode::OK, "pages/scanner", ctx)
}

// GET /signals
pub async fn get_signals(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let view = View::Signals;
    let snap = state.market();
    if !snap.loaded {
        return render::loading_response(&state, &headers, &view);
    }

    let cards: Vec<serde_json::Value> = signals_service::list_signals(&snap.assets)
        .into_iter()
        .map(|(a, s)| {
            json!({
                "id": a.id,
                "symbol": a.symbol,
                "name": a.name,
                "kind": s.kind.label(),
                "bullish": s.kind.is_bullish(),
                "score": s.score,
                "timeframe": s.timeframe.code(),
                "entry": fmt_price(s.entry_price),
                "stop_loss": fmt_price(s.stop_loss),
                "targets": s.targets.iter().map(|t| fmt_price(*t)).collect::<Vec<_>>(),
                "reasons": s.reasons,
            })
        })
        .collect();

    let ctx = json!({ "signals": cards, "has_signals": !cards.is_empty() });
    render::page_response(&state, &headers, &view, "Trading Signals", StatusCode::OK, "pages/signals", ctx)
}

#[derive(Deserialize, Default)]
pub struct DetailQuery {
    #[serde(default)]
    pub tf: Option<String>,
}

// GET /coins/:id?tf=1h
pub async fn get_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let view = View::Detail(id.clone());
    let snap = state.market();
    if !snap.loaded {
        return render::loading_response(&state, &headers, &view);
    }

    // unknown asset => back to the dashboard
    let Some(asset) = snap.find(&id).filter(|_| valid_asset_id(&id)).cloned() else {
        return home_controller::dashboard(State(state), headers).await;
    };

    let timeframe = query
        .tf
        .as_deref()
        .and_then(|t| t.parse::<Timeframe>().ok())
        .unwrap_or(Timeframe::H1);

    let price = state.prices.get(&asset.id).unwrap_or(asset.price);
    let signal = signals_service::signal_for(&asset);
    let ind = signals_service::indicators_for(&asset, price);
    let breakdown = signals_service::breakdown_for(&asset, price, &ind);

    let timeframes: Vec<serde_json::Value> = Timeframe::ALL
        .into_iter()
        .map(|tf| json!({ "code": tf.code(), "label": tf.code().to_uppercase(), "active": tf == timeframe }))
        .collect();

    let ctx = json!({
        "asset": {
            "id": asset.id,
            "symbol": asset.symbol,
            "name": asset.name,
            "category": asset.category,
        },
        "price": fmt_price(price),
        "change": fmt_pct(asset.change_24h),
        "up": asset.change_24h > 0.0,
        "timeframes": timeframes,
        "chart": chart_widget::widget_config(&asset.symbol, timeframe).to_string(),
        "signal": {
            "kind": signal.kind.label(),
            "bullish": signal.kind.is_bullish(),
            "score": signal.score,
            "entry": fmt_price(signal.entry_price),
            "stop_loss": fmt_price(signal.stop_loss),
            "targets": signal.targets.iter().map(|t| fmt_price(*t)).collect::<Vec<_>>(),
            "reasons": signal.reasons,
        },
        "breakdown": [
            { "label": "Trend Strength", "value": breakdown.trend },
            { "label": "Momentum", "value": breakdown.momentum },
            { "label": "Volume Flow", "value": breakdown.volume },
            { "label": "Volatility", "value": breakdown.volatility },
            { "label": "Market Sentiment", "value": breakdown.sentiment },
        ],
        "model_score": signals_service::composite_score(&breakdown),
        "indicators": {
            "rsi": fmt2(ind.rsi),
            "adx": format!("{:.0}", ind.adx),
            "ema50": fmt_price(ind.ema50),
            "ema200": fmt_price(ind.ema200),
            "atr": fmt_price(ind.atr),
            "bb_upper": fmt_price(ind.bollinger.upper),
            "bb_lower": fmt_price(ind.bollinger.lower),
        },
        "explanation": state.explainer.cached(&asset.id),
    });

    let title = format!("{} ({})", asset.name, asset.symbol);
    render::page_response(&state, &headers, &view, &title, StatusCode::OK, "pages/detail", ctx)
}

#[derive(Deserialize, Default)]
pub struct ExplainQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

// POST /coins/:id/explain
pub async fn post_explain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExplainQuery>,
) -> Response {
    let snap = state.market();
    let Some(asset) = snap.find(&id).filter(|_| valid_asset_id(&id)).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            Html(r#"<div class="text-muted small">Unknown asset.</div>"#.to_string()),
        )
            .into_response();
    };

    let price = state.prices.get(&asset.id).unwrap_or(asset.price);
    let signal = signals_service::signal_for(&asset);
    let ind = signals_service::indicators_for(&asset, price);
    let refresh = query.refresh.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let text = state
        .explainer
        .explain(&asset, price, &signal, &ind, refresh)
        .await;

    let html = render::render_partial(
        &state,
        "partials/explanation",
        &json!({ "asset_id": asset.id, "text": text }),
    );
    (StatusCode::OK, Html(html)).into_response()
}

// GET /api/prices
pub async fn get_prices_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "source": format!("{:?}", state.settings.price_source).to_lowercase(),
        "prices": state.prices.snapshot(),
    }))
}
