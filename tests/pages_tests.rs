use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use cryptopulse::{
    AppState, config,
    models::GlobalStats,
    routes,
    services::{
        explanation::MISSING_KEY_MSG,
        market_data::{MarketSnapshot, builtin_catalog},
    },
};
use tower::ServiceExt;

fn test_state() -> AppState {
    let mut settings = config::load();
    settings.market_offline = true;
    settings.gemini_api_key = String::new();

    AppState::new(settings).expect("app state")
}

fn loaded_state() -> AppState {
    let state = test_state();
    state.install_market(MarketSnapshot {
        assets: builtin_catalog(),
        stats: Some(GlobalStats::fallback()),
        loaded: true,
    });
    state
}

async fn response_body_string(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

async fn fetch(state: &AppState, uri: &str, htmx: bool) -> (StatusCode, String) {
    let mut req = Request::builder().uri(uri);
    if htmx {
        req = req.header("HX-Request", "true");
    }

    let res = routes::app(state.clone())
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    (status, response_body_string(res).await)
}

#[tokio::test]
async fn pages_show_loading_until_market_is_in() {
    let state = test_state();

    for uri in ["/", "/scanner", "/signals", "/portfolio", "/coins/bitcoin"] {
        let (status, body) = fetch(&state, uri, true).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains("Loading market data"), "{uri}");
    }
}

#[tokio::test]
async fn offline_load_installs_catalog() {
    let state = test_state();
    state.load_market().await;

    assert!(state.market().loaded);
    assert_eq!(state.market().assets.len(), 8);
    assert_eq!(state.prices.get("bitcoin"), Some(68_420.5));
}

#[tokio::test]
async fn dashboard_renders_full_layout_or_fragment() {
    let state = loaded_state();

    let (status, full) = fetch(&state, "/", false).await;
    assert_eq!(status, StatusCode::OK);
    assert!(full.contains("<html"));
    assert!(full.contains("Top Gainers"));
    assert!(full.contains("$2.45T"));

    let (_, fragment) = fetch(&state, "/", true).await;
    assert!(!fragment.contains("<html"));
    assert!(fragment.contains("Dogecoin"));
}

#[tokio::test]
async fn screens_render() {
    let state = loaded_state();

    let (status, body) = fetch(&state, "/scanner?filter=breakouts", true).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Solana"));
    assert!(!body.contains("Cardano"));

    let (_, body) = fetch(&state, "/signals", true).await;
    assert!(body.contains("STRONG BUY"));

    let (_, body) = fetch(&state, "/portfolio", true).await;
    assert!(body.contains("Total Value"));

    let (_, body) = fetch(&state, "/alerts", true).await;
    assert!(body.contains("/alerts/list"));
}

#[tokio::test]
async fn detail_page_and_unknown_asset() {
    let state = loaded_state();

    let (status, body) = fetch(&state, "/coins/solana?tf=4h", true).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Solana"));
    assert!(body.contains("BINANCE:SOLUSDT"));
    assert!(body.contains("/alerts/solana/list"));

    // unknown asset falls back to the dashboard
    let (status, body) = fetch(&state, "/coins/not-a-coin", true).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Top Gainers"));
}

#[tokio::test]
async fn explain_without_key_reports_unavailable() {
    let state = loaded_state();

    let res = routes::app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/coins/bitcoin/explain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(response_body_string(res).await.contains(MISSING_KEY_MSG));
    assert!(state.explainer.cached("bitcoin").is_none());
}

#[tokio::test]
async fn prices_json_and_fallbacks() {
    let state = loaded_state();

    let (status, body) = fetch(&state, "/api/prices", false).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["prices"]["ethereum"], 2642.12);

    let (status, _) = fetch(&state, "/health", false).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = fetch(&state, "/definitely/not/here", true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404"));
}

#[tokio::test]
async fn events_endpoint_streams_sse() {
    let state = loaded_state();

    let res = routes::app(state)
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn prices_socket_requires_upgrade() {
    let state = loaded_state();

    // a plain GET without the websocket handshake headers is refused
    let res = routes::app(state)
        .oneshot(Request::builder().uri("/ws/prices").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(res.status().is_client_error());
}
