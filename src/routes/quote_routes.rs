use axum::{Router, routing::get};
use crate::{AppState, controllers::quote_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/quote", get(quote_controller::get_quote).post(quote_controller::post_quote))
}
