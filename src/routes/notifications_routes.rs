use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::notifications_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/notifications", get(notifications_controller::get_notifications))
        .route("/notifications/:id/dismiss", post(notifications_controller::post_dismiss))
}
