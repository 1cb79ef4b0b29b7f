use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use crate::{models::CurrentUser, render, services::portfolio_service, AppState};

// GET /history
pub async fn get_history(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let transactions = match portfolio_service::list_transactions(&state.db, u.id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(user_id = u.id, error = %e, "could not load history");
            return render::apology(&state, &format!("db error: {e}"), StatusCode::INTERNAL_SERVER_ERROR, Some(&u));
        }
    };

    let items: Vec<serde_json::Value> = transactions
        .into_iter()
        .map(|t| {
            json!({
                "symbol": t.symbol,
                "shares": t.shares,
                "kind": if t.shares > 0 { "buy" } else { "sell" },
                "price": t.price,
                "timestamp": t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
        })
        .collect();

    render::page(
        &state,
        StatusCode::OK,
        "pages/history",
        "History",
        &json!({ "transactions": items, "has_transactions": !items.is_empty() }),
        Some(&u),
        None,
    )
}
