use axum::Router;
use tower_http::services::ServeDir;

use crate::{AppState, controllers::home_controller};

pub mod home_routes;
pub mod market_routes;
pub mod portfolio_routes;
pub mod alerts_routes;
pub mod notifications_routes;
pub mod realtime_routes;

/// The view router: one route group per screen, shared state threaded in.
pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = market_routes::add_routes(router);
    let router = portfolio_routes::add_routes(router);
    let router = alerts_routes::add_routes(router);
    let router = notifications_routes::add_routes(router);
    let router = realtime_routes::add_routes(router);

    router
        .nest_service("/static", ServeDir::new("static"))
        .fallback(home_controller::not_found)
        .with_state(state)
}
