use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    events::NOTIFICATIONS_UPDATED,
    render::{self, hx_trigger_value},
};

// GET /notifications
pub async fn get_notifications(State(state): State<AppState>) -> Response {
    let items: Vec<serde_json::Value> = state
        .notifications
        .list()
        .into_iter()
        .map(|n| {
            json!({
                "id": n.id.to_string(),
                "message": n.message,
                "severity": n.severity.as_str(),
            })
        })
        .collect();

    let html = render::render_partial(
        &state,
        "partials/notifications",
        &json!({ "notifications": items }),
    );
    (StatusCode::OK, Html(html)).into_response()
}

// POST /notifications/:id/dismiss
pub async fn post_dismiss(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(nid) = Uuid::parse_str(&id) else {
        return (StatusCode::BAD_REQUEST, Html("bad id".to_string())).into_response();
    };

    state.notifications.dismiss(nid);

    let mut headers = HeaderMap::new();
    headers.insert("HX-Trigger", hx_trigger_value(&[NOTIFICATIONS_UPDATED]));
    (StatusCode::OK, headers, Html("".to_string())).into_response()
}
