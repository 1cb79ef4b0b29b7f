use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub hash: String,

    // cents
    pub cash: i64,
}

/// The logged-in user, resolved from the session cookie by
/// `auth::inject_current_user` and stored in request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub session_id: String,
}
