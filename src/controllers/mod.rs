pub mod home_controller;
pub mod auth_controller;
pub mod quote_controller;
pub mod trading_controller;
pub mod history_controller;
