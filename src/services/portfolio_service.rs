use sqlx::SqlitePool;

use crate::{
    models::{Holding, Transaction},
    AppState,
};

#[derive(Debug, Clone)]
pub struct HoldingView {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct PortfolioView {
    pub holdings: Vec<HoldingView>,
    pub cash: i64,
    pub holdings_value: i64,
    pub grand_total: i64,
}

pub async fn get_cash(db: &SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT cash FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn list_holdings(db: &SqlitePool, user_id: i64) -> Result<Vec<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT user_id, symbol, shares FROM holdings WHERE user_id = ?1 ORDER BY symbol ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn get_holding(db: &SqlitePool, user_id: i64, symbol: &str) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT user_id, symbol, shares FROM holdings WHERE user_id = ?1 AND symbol = ?2",
    )
    .bind(user_id)
    .bind(symbol.trim().to_uppercase())
    .fetch_optional(db)
    .await
}

/// Newest first; ties broken by insertion order.
pub async fn list_transactions(db: &SqlitePool, user_id: i64) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, user_id, symbol, shares, price, timestamp
         FROM transactions
         WHERE user_id = ?1
         ORDER BY timestamp DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Prices every holding at the current quote. Holdings whose quote cannot be
/// resolved are left out of the view.
pub async fn portfolio_view(state: &AppState, user_id: i64) -> Result<PortfolioView, sqlx::Error> {
    let cash = get_cash(&state.db, user_id).await?;
    let holdings = list_holdings(&state.db, user_id).await?;

    let mut views: Vec<HoldingView> = vec![];
    for h in holdings {
        let Some(q) = state.quotes.lookup(&h.symbol).await else {
            tracing::warn!(symbol = %h.symbol, "no quote for held symbol, skipping");
            continue;
        };

        views.push(HoldingView {
            total: h.shares.saturating_mul(q.price),
            symbol: h.symbol,
            name: q.name,
            shares: h.shares,
            price: q.price,
        });
    }

    let holdings_value = views.iter().fold(0i64, |acc, v| acc.saturating_add(v.total));

    Ok(PortfolioView {
        holdings: views,
        cash,
        holdings_value,
        grand_total: cash.saturating_add(holdings_value),
    })
}
