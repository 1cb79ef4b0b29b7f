use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One row of the append-only ledger.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,

    // positive = buy, negative = sell
    pub shares: i64,
    // cents per share at execution
    pub price: i64,

    pub timestamp: DateTime<Utc>,
}
