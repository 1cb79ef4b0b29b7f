use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        hash TEXT NOT NULL,
        cash INTEGER NOT NULL CHECK (cash >= 0)
    )",
    // users: unique username
    "CREATE UNIQUE INDEX IF NOT EXISTS users_username ON users (username)",
    "CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id),
        symbol TEXT NOT NULL,
        shares INTEGER NOT NULL CHECK (shares <> 0),
        price INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    )",
    // history is read per user, newest first
    "CREATE INDEX IF NOT EXISTS transactions_user_time ON transactions (user_id, timestamp DESC)",
    "CREATE TABLE IF NOT EXISTS holdings (
        user_id INTEGER NOT NULL REFERENCES users (id),
        symbol TEXT NOT NULL,
        shares INTEGER NOT NULL CHECK (shares > 0),
        PRIMARY KEY (user_id, symbol)
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id),
        flash TEXT,
        created_at TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    )",
    // create_session purges by expiry
    "CREATE INDEX IF NOT EXISTS sessions_expires ON sessions (expires_at)",
];

/// Opens the pool for `database_url`, creating the SQLite file if needed.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(opts)
        .await
}

/// Single-connection in-memory database. Every connection to `sqlite::memory:`
/// is a separate database, so the pool must never recycle its one connection.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

pub async fn ensure_schema(db: &SqlitePool) -> Result<(), String> {
    // databases created before sessions expired lack the column; their
    // sessions come back already expired
    let sessions_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sessions'",
    )
    .fetch_one(db)
    .await
    .map_err(|e| e.to_string())?;
    if sessions_exists > 0 {
        let has_expiry = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pragma_table_info('sessions') WHERE name = 'expires_at'",
        )
        .fetch_one(db)
        .await
        .map_err(|e| e.to_string())?;
        if has_expiry == 0 {
            sqlx::query("ALTER TABLE sessions ADD COLUMN expires_at INTEGER NOT NULL DEFAULT 0")
                .execute(db)
                .await
                .map_err(|e| e.to_string())?;
        }
    }

    for stmt in SCHEMA {
        sqlx::query(stmt)
            .execute(db)
            .await
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}
