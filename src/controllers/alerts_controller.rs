use std::collections::BTreeMap;

use axum::{
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    controllers::valid_asset_id,
    events::{ALERTS_UPDATED, NOTIFICATIONS_UPDATED},
    format::fmt_price,
    models::{Alert, Direction},
    render::{self, View, hx_trigger_value},
};

fn error_snippet(msg: &str) -> Response {
    (
        StatusCode::OK,
        Html(format!(r#"<div class="text-danger small">{msg}</div>"#)),
    )
        .into_response()
}

fn alert_json(a: &Alert) -> serde_json::Value {
    json!({
        "id": a.id.to_string(),
        "asset_id": a.asset_id,
        "symbol": a.symbol,
        "direction": a.direction.as_str(),
        "target_price": fmt_price(a.target_price),
        "target_price_raw": a.target_price,
        "active": a.active,
        "created_at": a.created_at,
        "triggered_at": a.triggered_at,
    })
}

// ---------------- Pages ----------------

// GET /alerts
pub async fn get_alerts_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render::page_response(&state, &headers, &View::Alerts, "Price Alerts", StatusCode::OK, "pages/alerts", json!({}))
}

// ---------------- Partials ----------------

#[derive(Deserialize)]
pub struct CreateAlertForm {
    #[serde(rename = "targetPrice")]
    pub target_price: String,
    pub condition: String,
}

// GET /alerts/:asset_id/list
pub async fn get_alerts_list(State(state): State<AppState>, Path(asset_id): Path<String>) -> Response {
    let items: Vec<serde_json::Value> = state
        .alerts
        .list_by_asset(&asset_id)
        .iter()
        .map(alert_json)
        .collect();

    let ctx = json!({ "asset_id": asset_id, "alerts": items, "has_alerts": !items.is_empty() });
    let html = render::render_partial(&state, "partials/alerts_list", &ctx);

    (StatusCode::OK, Html(html)).into_response()
}

// POST /alerts/:asset_id
pub async fn post_create_alert(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    Form(form): Form<CreateAlertForm>,
) -> Response {
    if !valid_asset_id(&asset_id) {
        return (StatusCode::BAD_REQUEST, Html("bad asset id".to_string())).into_response();
    }

    let Some(asset) = state.market().find(&asset_id).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            Html(r#"<div class="text-danger small">Unknown asset.</div>"#.to_string()),
        )
            .into_response();
    };

    let Ok(direction) = form.condition.parse::<Direction>() else {
        return error_snippet("Please choose a valid condition.");
    };

    let target: f64 = match form.target_price.trim().parse() {
        Ok(v) => v,
        Err(_) => return error_snippet("Please enter a valid target price."),
    };

    if let Err(e) = state.create_alert(&asset.id, &asset.symbol, target, direction) {
        tracing::debug!("alert rejected: {}", e);
        return error_snippet("Please enter a valid target price.");
    }

    let mut headers = HeaderMap::new();
    headers.insert("HX-Trigger", hx_trigger_value(&[ALERTS_UPDATED, NOTIFICATIONS_UPDATED]));

    (
        StatusCode::OK,
        headers,
        Html(r#"<div class="text-success small">Alert created.</div>"#.to_string()),
    )
        .into_response()
}

// POST /alerts/by-id/:id/delete
pub async fn post_delete_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(alert_id) = Uuid::parse_str(&id) else {
        return (StatusCode::BAD_REQUEST, Html("bad id".to_string())).into_response();
    };

    // deleting twice is fine
    state.alerts.remove(alert_id);

    let mut headers = HeaderMap::new();
    headers.insert("HX-Trigger", hx_trigger_value(&[ALERTS_UPDATED]));

    (StatusCode::OK, headers, Html("".to_string())).into_response()
}

// GET /alerts/list
pub async fn get_watchlist_alerts(State(state): State<AppState>) -> Response {
    let body = render::render_partial(&state, "partials/watchlist_alerts", &watchlist_ctx(&state));
    (StatusCode::OK, Html(body)).into_response()
}

fn watchlist_ctx(state: &AppState) -> serde_json::Value {
    let mut map: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
    for a in state.alerts.list_all() {
        map.entry(a.symbol.clone()).or_default().push(alert_json(&a));
    }

    let groups: Vec<serde_json::Value> = map
        .into_iter()
        .map(|(symbol, alerts)| json!({ "symbol": symbol, "alerts": alerts }))
        .collect();

    json!({
        "groups": if groups.is_empty() { serde_json::Value::Null } else { serde_json::Value::Array(groups) }
    })
}
