use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{AppState, controllers::home_controller};

pub mod home_routes;
pub mod auth_routes;
pub mod quote_routes;
pub mod trading_routes;
pub mod history_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = auth_routes::add_routes(router);
    let router = quote_routes::add_routes(router);
    let router = trading_routes::add_routes(router);
    let router = history_routes::add_routes(router);

    router
        .nest_service("/static", ServeDir::new("static"))
        .fallback(home_controller::not_found)
        .layer(from_fn(crate::auth::require_auth))
        .layer(from_fn_with_state(state.clone(), crate::auth::inject_current_user))
        .layer(from_fn(crate::auth::no_cache))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
