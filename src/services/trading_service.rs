use chrono::Utc;
use sqlx::SqlitePool;

use crate::{error::TradeError, render::usd, AppState};

use super::quotes::normalize_symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn parse(raw: &str) -> Result<Self, TradeError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            _ => Err(TradeError::invalid("must select an action")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub action: TradeAction,
    pub symbol: String,
    pub shares: i64,
    pub price: i64,
    pub total: i64,
    pub cash_after: i64,
}

impl TradeReceipt {
    pub fn flash_message(&self) -> String {
        let verb = match self.action {
            TradeAction::Buy => "Bought",
            TradeAction::Sell => "Sold",
        };
        format!("{verb} {} shares of {} for {}!", self.shares, self.symbol, usd(self.total))
    }
}

pub fn validate_symbol(raw: &str) -> Result<String, TradeError> {
    let sym = normalize_symbol(raw);
    if sym.is_empty() {
        return Err(TradeError::invalid("must provide symbol"));
    }
    Ok(sym)
}

pub fn parse_shares(raw: &str) -> Result<i64, TradeError> {
    let shares: i64 = raw
        .trim()
        .parse()
        .map_err(|_| TradeError::invalid("must provide positive integer for shares"))?;
    if shares <= 0 {
        return Err(TradeError::invalid("must provide positive number for shares"));
    }
    Ok(shares)
}

fn order_total(shares: i64, price: i64) -> Result<i64, TradeError> {
    shares
        .checked_mul(price)
        .ok_or_else(|| TradeError::invalid("share count is too large"))
}

/// Debits cash, appends the ledger row and upserts the holding in one
/// database transaction. The funds check is part of the debit statement.
pub async fn apply_buy(
    db: &SqlitePool,
    user_id: i64,
    symbol: &str,
    shares: i64,
    price: i64,
) -> Result<TradeReceipt, TradeError> {
    if shares <= 0 {
        return Err(TradeError::invalid("must provide positive number for shares"));
    }
    let total = order_total(shares, price)?;

    let mut tx = db.begin().await?;

    let debited = sqlx::query("UPDATE users SET cash = cash - ?1 WHERE id = ?2 AND cash >= ?1")
        .bind(total)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if debited.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        return match exists {
            Some(_) => Err(TradeError::InsufficientFunds),
            None => Err(TradeError::Storage(sqlx::Error::RowNotFound)),
        };
    }

    sqlx::query("INSERT INTO transactions (user_id, symbol, shares, price, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(user_id)
        .bind(symbol)
        .bind(shares)
        .bind(price)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO holdings (user_id, symbol, shares) VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id, symbol) DO UPDATE SET shares = shares + excluded.shares",
    )
    .bind(user_id)
    .bind(symbol)
    .bind(shares)
    .execute(&mut *tx)
    .await?;

    let cash_after = sqlx::query_scalar::<_, i64>("SELECT cash FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(TradeReceipt {
        action: TradeAction::Buy,
        symbol: symbol.to_string(),
        shares,
        price,
        total,
        cash_after,
    })
}

/// Removes or decrements the holding, credits cash and appends the negative
/// ledger row in one database transaction. The share check is part of the
/// holding write, so concurrent sells cannot both pass it.
pub async fn apply_sell(
    db: &SqlitePool,
    user_id: i64,
    symbol: &str,
    shares: i64,
    price: i64,
) -> Result<TradeReceipt, TradeError> {
    if shares <= 0 {
        return Err(TradeError::invalid("must provide positive number for shares"));
    }
    let total = order_total(shares, price)?;

    let mut tx = db.begin().await?;

    // selling the whole position removes the row
    let removed = sqlx::query("DELETE FROM holdings WHERE user_id = ?1 AND symbol = ?2 AND shares = ?3")
        .bind(user_id)
        .bind(symbol)
        .bind(shares)
        .execute(&mut *tx)
        .await?;

    if removed.rows_affected() == 0 {
        let reduced = sqlx::query(
            "UPDATE holdings SET shares = shares - ?3 WHERE user_id = ?1 AND symbol = ?2 AND shares > ?3",
        )
        .bind(user_id)
        .bind(symbol)
        .bind(shares)
        .execute(&mut *tx)
        .await?;

        if reduced.rows_affected() == 0 {
            return Err(TradeError::InsufficientShares);
        }
    }

    sqlx::query("UPDATE users SET cash = cash + ?1 WHERE id = ?2")
        .bind(total)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO transactions (user_id, symbol, shares, price, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(user_id)
        .bind(symbol)
        .bind(-shares)
        .bind(price)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    let cash_after = sqlx::query_scalar::<_, i64>("SELECT cash FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(TradeReceipt {
        action: TradeAction::Sell,
        symbol: symbol.to_string(),
        shares,
        price,
        total,
        cash_after,
    })
}

/// Validates the order, prices it with the quote provider and applies it.
pub async fn market_trade(
    state: &AppState,
    user_id: i64,
    symbol: &str,
    action: TradeAction,
    shares: i64,
) -> Result<TradeReceipt, TradeError> {
    let sym = validate_symbol(symbol)?;
    if shares <= 0 {
        return Err(TradeError::invalid("must provide positive number for shares"));
    }

    let quote = state
        .quotes
        .lookup(&sym)
        .await
        .ok_or(TradeError::InvalidSymbol)?;

    let result = match action {
        TradeAction::Buy => apply_buy(&state.db, user_id, &quote.symbol, shares, quote.price).await,
        TradeAction::Sell => apply_sell(&state.db, user_id, &quote.symbol, shares, quote.price).await,
    };

    match &result {
        Ok(r) => tracing::info!(
            user_id,
            action = r.action.as_str(),
            symbol = %r.symbol,
            shares = r.shares,
            price = r.price,
            "trade executed"
        ),
        Err(TradeError::Storage(e)) => tracing::error!(user_id, symbol = %sym, error = %e, "trade failed"),
        Err(e) => tracing::info!(user_id, symbol = %sym, reason = %e, "trade rejected"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shares_rejects_non_positive_and_non_integers() {
        assert_eq!(parse_shares(" 7 ").ok(), Some(7));
        assert!(parse_shares("0").is_err());
        assert!(parse_shares("-2").is_err());
        assert!(parse_shares("1.5").is_err());
        assert!(parse_shares("ten").is_err());
        assert!(parse_shares("").is_err());
    }

    #[test]
    fn action_parse_is_case_insensitive() {
        assert_eq!(TradeAction::parse("BUY").ok(), Some(TradeAction::Buy));
        assert_eq!(TradeAction::parse("sell").ok(), Some(TradeAction::Sell));
        assert!(TradeAction::parse("__Select__").is_err());
    }

    #[test]
    fn receipt_flash_mentions_total() {
        let r = TradeReceipt {
            action: TradeAction::Sell,
            symbol: "AAPL".into(),
            shares: 3,
            price: 10_050,
            total: 30_150,
            cash_after: 0,
        };
        assert_eq!(r.flash_message(), "Sold 3 shares of AAPL for $301.50!");
    }

    #[test]
    fn overflowing_total_is_invalid_input() {
        assert!(matches!(order_total(i64::MAX, 2), Err(TradeError::InvalidInput(_))));
    }
}
