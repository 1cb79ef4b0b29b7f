use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;

use crate::{
    models::CurrentUser,
    render,
    services::{portfolio_service, session_service},
    AppState,
};

// GET / (portfolio)
pub async fn index(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let view = match portfolio_service::portfolio_view(&state, u.id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(user_id = u.id, error = %e, "could not load portfolio");
            return render::apology(&state, &format!("db error: {e}"), StatusCode::INTERNAL_SERVER_ERROR, Some(&u));
        }
    };

    let flash = session_service::take_flash(&state, &u.session_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read flash message");
            None
        });

    let stocks: Vec<serde_json::Value> = view
        .holdings
        .iter()
        .map(|h| {
            json!({
                "symbol": h.symbol,
                "name": h.name,
                "shares": h.shares,
                "price": h.price,
                "total": h.total,
            })
        })
        .collect();

    let ctx = json!({
        "stocks": stocks,
        "has_stocks": !stocks.is_empty(),
        "cash": view.cash,
        "total_value": view.holdings_value,
        "grand_total": view.grand_total,
    });

    render::page(&state, StatusCode::OK, "pages/index", "Portfolio", &ctx, Some(&u), flash)
}

pub async fn not_found(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, StatusCode::NOT_FOUND, "pages/not_found", "404", &json!({}), user_ref, None)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}

pub async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (StatusCode::OK, Html("db: ok".to_string())).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("db error: {}", e)),
        )
            .into_response(),
    }
}
