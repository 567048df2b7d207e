use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, error::AppError};

/// Top-level screens. `Detail` carries the asset being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Scanner,
    Signals,
    Portfolio,
    Alerts,
    Detail(String),
}

impl View {
    const NAV: [View; 5] = [
        View::Dashboard,
        View::Scanner,
        View::Signals,
        View::Portfolio,
        View::Alerts,
    ];

    pub fn path(&self) -> String {
        match self {
            View::Dashboard => "/".to_string(),
            View::Scanner => "/scanner".to_string(),
            View::Signals => "/signals".to_string(),
            View::Portfolio => "/portfolio".to_string(),
            View::Alerts => "/alerts".to_string(),
            View::Detail(id) => format!("/coins/{id}"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Scanner => "Scanner",
            View::Signals => "Signals",
            View::Portfolio => "Portfolio",
            View::Alerts => "Alerts",
            View::Detail(_) => "Asset",
        }
    }

    fn nav_items(&self) -> Vec<serde_json::Value> {
        View::NAV
            .iter()
            .map(|v| json!({ "label": v.label(), "path": v.path(), "active": v == self }))
            .collect()
    }
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn hx_trigger_value(events: &[&str]) -> HeaderValue {
    if events.len() == 1 {
        return HeaderValue::from_str(events[0]).unwrap_or_else(|_| HeaderValue::from_static(""));
    }

    let mut map = serde_json::Map::new();
    for &e in events {
        map.insert(e.to_string(), serde_json::Value::Bool(true));
    }

    let json = serde_json::Value::Object(map).to_string();
    HeaderValue::from_str(&json).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn render_partial(state: &AppState, tpl: &str, ctx: &serde_json::Value) -> String {
    state
        .hbs
        .render(tpl, ctx)
        .unwrap_or_else(|e| format!("template error: {e}"))
}

pub fn render_full(state: &AppState, view: &View, title: &str, body_html: String) -> Result<String, AppError> {
    let ctx = json!({
        "title": title,
        "body": body_html,
        "nav": view.nav_items(),
        "price_source": format!("{:?}", state.settings.price_source).to_lowercase(),
    });

    Ok(state.hbs.render("layouts/base", &ctx)?)
}

/// Fragment for HTMX navigation, full layout otherwise.
pub fn page_response(
    state: &AppState,
    headers: &HeaderMap,
    view: &View,
    title: &str,
    status: StatusCode,
    tpl: &str,
    ctx: serde_json::Value,
) -> Response {
    let body = match state.hbs.render(tpl, &ctx) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("render {} failed: {}", tpl, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("template error: {e}"))).into_response();
        }
    };

    if is_htmx(headers) {
        return (status, Html(body)).into_response();
    }

    match render_full(state, view, title, body) {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e.to_string())).into_response(),
    }
}

/// Shown until the startup market load has completed.
pub fn loading_response(state: &AppState, headers: &HeaderMap, view: &View) -> Response {
    page_response(
        state,
        headers,
        view,
        "Loading",
        StatusCode::OK,
        "pages/loading",
        json!({ "path": view.path() }),
    )
}
