use std::sync::Arc;

use tradesim::{
    config,
    error::TradeError,
    services::{
        auth_service, db_init, portfolio_service,
        quotes::StaticQuotes,
        trading_service::{self, TradeAction},
    },
    templates, AppState,
};

const START: i64 = 1_000_000;

async fn state_with_pool(db: sqlx::SqlitePool) -> AppState {
    let mut settings = config::load();
    settings.bcrypt_cost = 4;
    settings.starting_cash_cents = START;

    db_init::ensure_schema(&db).await.unwrap();

    let quotes = StaticQuotes::new()
        .with_quote("AAPL", "Apple Inc.", 15_000)
        .with_quote("MSFT", "Microsoft Corporation", 40_000);

    AppState {
        hbs: templates::build_handlebars(),
        db,
        settings,
        quotes: Arc::new(quotes),
    }
}

async fn test_state() -> AppState {
    state_with_pool(db_init::connect_in_memory().await.unwrap()).await
}

async fn new_user(state: &AppState, name: &str) -> i64 {
    auth_service::register_user(state, name, "s3cret!pw", "s3cret!pw")
        .await
        .unwrap()
}

async fn ledger_sum(state: &AppState, user_id: i64, symbol: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(shares), 0) FROM transactions WHERE user_id = ?1 AND symbol = ?2",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_one(&state.db)
    .await
    .unwrap()
}

async fn ledger_value(state: &AppState, user_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(shares * price), 0) FROM transactions WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(&state.db)
        .await
        .unwrap()
}

async fn held(state: &AppState, user_id: i64, symbol: &str) -> Option<i64> {
    portfolio_service::get_holding(&state.db, user_id, symbol)
        .await
        .unwrap()
        .map(|h| h.shares)
}

async fn cash(state: &AppState, user_id: i64) -> i64 {
    portfolio_service::get_cash(&state.db, user_id).await.unwrap()
}

#[tokio::test]
async fn buy_debits_cash_and_increases_holding() {
    let state = test_state().await;
    let uid = new_user(&state, "alice").await;

    let r = trading_service::apply_buy(&state.db, uid, "AAPL", 4, 15_000).await.unwrap();
    assert_eq!(r.total, 60_000);
    assert_eq!(r.cash_after, START - 60_000);
    assert_eq!(cash(&state, uid).await, START - 60_000);
    assert_eq!(held(&state, uid, "AAPL").await, Some(4));

    trading_service::apply_buy(&state.db, uid, "AAPL", 2, 16_000).await.unwrap();
    assert_eq!(cash(&state, uid).await, START - 60_000 - 32_000);
    assert_eq!(held(&state, uid, "AAPL").await, Some(6));
}

#[tokio::test]
async fn buy_with_insufficient_cash_leaves_state_unchanged() {
    let state = test_state().await;
    let uid = new_user(&state, "bob").await;

    let err = trading_service::apply_buy(&state.db, uid, "MSFT", 26, 40_000).await.unwrap_err();
    assert!(matches!(err, TradeError::InsufficientFunds));

    assert_eq!(cash(&state, uid).await, START);
    assert_eq!(held(&state, uid, "MSFT").await, None);
    assert_eq!(ledger_sum(&state, uid, "MSFT").await, 0);
}

#[tokio::test]
async fn spending_exactly_all_cash_is_allowed() {
    let state = test_state().await;
    let uid = new_user(&state, "carol").await;

    trading_service::apply_buy(&state.db, uid, "MSFT", 25, 40_000).await.unwrap();
    assert_eq!(cash(&state, uid).await, 0);
}

#[tokio::test]
async fn selling_more_than_held_is_rejected_and_state_unchanged() {
    let state = test_state().await;
    let uid = new_user(&state, "dave").await;
    trading_service::apply_buy(&state.db, uid, "AAPL", 3, 15_000).await.unwrap();
    let before = cash(&state, uid).await;

    let err = trading_service::apply_sell(&state.db, uid, "AAPL", 4, 15_000).await.unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares));

    assert_eq!(cash(&state, uid).await, before);
    assert_eq!(held(&state, uid, "AAPL").await, Some(3));
    assert_eq!(ledger_sum(&state, uid, "AAPL").await, 3);

    // never held at all
    let err = trading_service::apply_sell(&state.db, uid, "MSFT", 1, 40_000).await.unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares));
}

#[tokio::test]
async fn holding_row_removed_exactly_at_zero() {
    let state = test_state().await;
    let uid = new_user(&state, "erin").await;
    trading_service::apply_buy(&state.db, uid, "AAPL", 5, 15_000).await.unwrap();

    let r = trading_service::apply_sell(&state.db, uid, "AAPL", 4, 17_000).await.unwrap();
    assert_eq!(r.total, 68_000);
    assert_eq!(held(&state, uid, "AAPL").await, Some(1));

    trading_service::apply_sell(&state.db, uid, "AAPL", 1, 17_000).await.unwrap();
    assert_eq!(held(&state, uid, "AAPL").await, None);
    assert_eq!(ledger_sum(&state, uid, "AAPL").await, 0);
    assert_eq!(cash(&state, uid).await, START - 75_000 + 85_000);
}

#[tokio::test]
async fn storage_failure_mid_trade_rolls_back_cash_debit() {
    let state = test_state().await;
    let uid = new_user(&state, "frank").await;

    // the debit succeeds, then the ledger insert fails
    sqlx::query("DROP TABLE transactions").execute(&state.db).await.unwrap();

    let err = trading_service::apply_buy(&state.db, uid, "AAPL", 1, 15_000).await.unwrap_err();
    assert!(matches!(err, TradeError::Storage(_)));

    assert_eq!(cash(&state, uid).await, START);
    assert_eq!(held(&state, uid, "AAPL").await, None);
}

#[tokio::test]
async fn storage_failure_mid_sell_restores_holding() {
    let state = test_state().await;
    let uid = new_user(&state, "frida").await;
    trading_service::apply_buy(&state.db, uid, "AAPL", 5, 100).await.unwrap();
    let cash_before = cash(&state, uid).await;

    // the holding change succeeds, then the ledger insert fails
    sqlx::query("DROP TABLE transactions").execute(&state.db).await.unwrap();

    // whole position: the holding row is deleted before the failure
    let err = trading_service::apply_sell(&state.db, uid, "AAPL", 5, 100).await.unwrap_err();
    assert!(matches!(err, TradeError::Storage(_)));
    assert_eq!(held(&state, uid, "AAPL").await, Some(5));
    assert_eq!(cash(&state, uid).await, cash_before);

    // partial: the holding row is decremented before the failure
    let err = trading_service::apply_sell(&state.db, uid, "AAPL", 2, 100).await.unwrap_err();
    assert!(matches!(err, TradeError::Storage(_)));
    assert_eq!(held(&state, uid, "AAPL").await, Some(5));
    assert_eq!(cash(&state, uid).await, cash_before);
}

#[tokio::test]
async fn ledger_invariants_hold_after_mixed_trades() {
    let state = test_state().await;
    let uid = new_user(&state, "grace").await;

    let steps: &[(TradeAction, &str, i64, i64)] = &[
        (TradeAction::Buy, "AAPL", 10, 15_000),
        (TradeAction::Buy, "MSFT", 3, 40_000),
        (TradeAction::Sell, "AAPL", 4, 15_500),
        (TradeAction::Buy, "AAPL", 1, 14_900),
        (TradeAction::Sell, "MSFT", 3, 41_000),
        (TradeAction::Sell, "AAPL", 9, 1),
        (TradeAction::Sell, "AAPL", 1, 16_000),
    ];

    for (action, sym, n, price) in steps {
        let res = match action {
            TradeAction::Buy => trading_service::apply_buy(&state.db, uid, sym, *n, *price).await,
            TradeAction::Sell => trading_service::apply_sell(&state.db, uid, sym, *n, *price).await,
        };
        // the 9-share sell exceeds the 7 held and must be rejected
        if *n == 9 {
            assert!(matches!(res, Err(TradeError::InsufficientShares)));
        } else {
            res.unwrap();
        }

        for s in ["AAPL", "MSFT"] {
            assert_eq!(held(&state, uid, s).await.unwrap_or(0), ledger_sum(&state, uid, s).await);
        }
        assert_eq!(cash(&state, uid).await + ledger_value(&state, uid).await, START);
    }

    assert_eq!(held(&state, uid, "AAPL").await, Some(6));
    assert_eq!(held(&state, uid, "MSFT").await, None);
}

#[tokio::test]
async fn market_trade_prices_with_quote_and_normalizes_symbol() {
    let state = test_state().await;
    let uid = new_user(&state, "heidi").await;

    let r = trading_service::market_trade(&state, uid, " aapl ", TradeAction::Buy, 2).await.unwrap();
    assert_eq!(r.symbol, "AAPL");
    assert_eq!(r.price, 15_000);
    assert_eq!(r.flash_message(), "Bought 2 shares of AAPL for $300.00!");
    assert_eq!(held(&state, uid, "AAPL").await, Some(2));
}

#[tokio::test]
async fn market_trade_rejects_unknown_symbol_and_bad_input() {
    let state = test_state().await;
    let uid = new_user(&state, "ivan").await;

    let err = trading_service::market_trade(&state, uid, "ZZZZ", TradeAction::Buy, 1).await.unwrap_err();
    assert!(matches!(err, TradeError::InvalidSymbol));

    let err = trading_service::market_trade(&state, uid, "  ", TradeAction::Buy, 1).await.unwrap_err();
    assert!(matches!(err, TradeError::InvalidInput(_)));

    let err = trading_service::market_trade(&state, uid, "AAPL", TradeAction::Sell, 0).await.unwrap_err();
    assert!(matches!(err, TradeError::InvalidInput(_)));

    assert_eq!(cash(&state, uid).await, START);
}

#[tokio::test]
async fn concurrent_sells_of_whole_position_only_one_wins() {
    let path = std::env::temp_dir().join(format!("tradesim-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());

    let state = state_with_pool(db_init::connect(&url).await.unwrap()).await;
    let uid = new_user(&state, "judy").await;
    trading_service::apply_buy(&state.db, uid, "AAPL", 10, 15_000).await.unwrap();

    let (a, b) = tokio::join!(
        trading_service::apply_sell(&state.db, uid, "AAPL", 10, 15_000),
        trading_service::apply_sell(&state.db, uid, "AAPL", 10, 15_000),
    );

    let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1);

    assert_eq!(held(&state, uid, "AAPL").await, None);
    assert_eq!(ledger_sum(&state, uid, "AAPL").await, 0);
    assert_eq!(cash(&state, uid).await, START);

    state.db.close().await;
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[tokio::test]
async fn concurrent_buys_cannot_overspend() {
    let path = std::env::temp_dir().join(format!("tradesim-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());

    let state = state_with_pool(db_init::connect(&url).await.unwrap()).await;
    let uid = new_user(&state, "karl").await;

    // each order costs $6,000 of the $10,000 balance
    let (a, b) = tokio::join!(
        trading_service::apply_buy(&state.db, uid, "AAPL", 40, 15_000),
        trading_service::apply_buy(&state.db, uid, "AAPL", 40, 15_000),
    );

    let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(TradeError::InsufficientFunds)));

    assert_eq!(cash(&state, uid).await, START - 600_000);
    assert_eq!(held(&state, uid, "AAPL").await, Some(40));
    assert_eq!(ledger_sum(&state, uid, "AAPL").await, 40);

    state.db.close().await;
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
