use axum::{Router, routing::get};
use crate::{AppState, controllers::portfolio_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/portfolio", get(portfolio_controller::get_portfolio_page))
}
