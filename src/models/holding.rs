use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Holding {
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
}
