use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::market_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/scanner", get(market_controller::get_scanner))
        .route("/signals", get(market_controller::get_signals))
        .route("/coins/:id", get(market_controller::get_detail))
        .route("/coins/:id/explain", post(market_controller::post_explain))
        .route("/api/prices", get(market_controller::get_prices_json))
}
