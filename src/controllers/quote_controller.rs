use axum::{
    extract::{Extension, Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{models::CurrentUser, render, services::quotes::normalize_symbol, AppState};

#[derive(Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}

// GET /quote
pub async fn get_quote(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    render::page(&state, StatusCode::OK, "pages/quote", "Quote", &json!({}), Some(&u), None)
}

// POST /quote
pub async fn post_quote(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<QuoteForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let sym = normalize_symbol(&form.symbol);
    if sym.is_empty() {
        return render::apology(&state, "Must provide symbol", StatusCode::BAD_REQUEST, Some(&u));
    }

    let Some(stock) = state.quotes.lookup(&sym).await else {
        return render::apology(&state, "Invalid symbol", StatusCode::BAD_REQUEST, Some(&u));
    };

    render::page(
        &state,
        StatusCode::OK,
        "pages/quoted",
        "Quoted",
        &json!({ "stock": stock }),
        Some(&u),
        None,
    )
}
