use axum::{
    extract::{Extension, Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::TradeError,
    models::CurrentUser,
    render,
    services::{
        portfolio_service, session_service,
        trading_service::{self, TradeAction, TradeReceipt},
    },
    AppState,
};

#[derive(Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
    #[serde(default)]
    pub action: String,
}

// Redirects home with the receipt as the flash message.
async fn finish_trade(state: &AppState, user: &CurrentUser, receipt: TradeReceipt) -> Response {
    if let Err(e) = session_service::set_flash(state, &user.session_id, &receipt.flash_message()).await {
        tracing::warn!(error = %e, "could not store flash message");
    }
    Redirect::to("/").into_response()
}

async fn run_trade(
    state: &AppState,
    user: &CurrentUser,
    form: &TradeForm,
    action: TradeAction,
) -> Result<TradeReceipt, TradeError> {
    let symbol = trading_service::validate_symbol(&form.symbol)?;
    let shares = trading_service::parse_shares(&form.shares)?;
    trading_service::market_trade(state, user.id, &symbol, action, shares).await
}

// GET /buy
pub async fn get_buy(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    render::page(&state, StatusCode::OK, "pages/buy", "Buy", &json!({}), Some(&u), None)
}

// POST /buy
pub async fn post_buy(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<TradeForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    match run_trade(&state, &u, &form, TradeAction::Buy).await {
        Ok(receipt) => finish_trade(&state, &u, receipt).await,
        Err(e) => render::apology(&state, &e.to_string(), e.buy_status(), Some(&u)),
    }
}

// GET /sell
pub async fn get_sell(State(state): State<AppState>, user: Option<Extension<CurrentUser>>) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let holdings = match portfolio_service::list_holdings(&state.db, u.id).await {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(error = %e, "could not list holdings");
            return render::apology(&state, &format!("db error: {e}"), StatusCode::INTERNAL_SERVER_ERROR, Some(&u));
        }
    };

    let stocks: Vec<serde_json::Value> = holdings
        .into_iter()
        .map(|h| json!({ "symbol": h.symbol, "shares": h.shares }))
        .collect();

    render::page(
        &state,
        StatusCode::OK,
        "pages/sell",
        "Sell",
        &json!({ "stocks": stocks }),
        Some(&u),
        None,
    )
}

// POST /sell
pub async fn post_sell(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<TradeForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    match run_trade(&state, &u, &form, TradeAction::Sell).await {
        Ok(receipt) => finish_trade(&state, &u, receipt).await,
        Err(e) => render::apology(&state, &e.to_string(), e.sell_status(), Some(&u)),
    }
}

// POST /trade (buy or sell from the portfolio page)
pub async fn post_trade(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<TradeForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return Redirect::to("/login").into_response();
    };

    let result = match (trading_service::validate_symbol(&form.symbol), TradeAction::parse(&form.action)) {
        (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        (Ok(_), Ok(action)) => run_trade(&state, &u, &form, action).await,
    };

    match result {
        Ok(receipt) => finish_trade(&state, &u, receipt).await,
        Err(e) => render::apology(&state, &e.to_string(), e.trade_status(), Some(&u)),
    }
}
