pub mod db_init;
pub mod quotes;
pub mod finnhub;

pub mod auth_service;
pub mod session_service;
pub mod trading_service;
pub mod portfolio_service;
