pub mod user;
pub mod transaction;
pub mod holding;

pub use user::{CurrentUser, User};
pub use transaction::Transaction;
pub use holding::Holding;
