use std::sync::LazyLock;

use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify};
use regex::Regex;

use crate::{
    error::{LoginError, RegisterError},
    models::User,
    AppState,
};

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("digit regex"));
static SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("special char regex"));

pub fn auth_cookie(state: &AppState, session_id: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.session_cookie_name.clone(), session_id);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if state.settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}

pub fn clear_auth_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.session_cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}

/// Field checks, in the order they are reported.
pub fn validate_registration(username: &str, password: &str, confirmation: &str) -> Result<(), RegisterError> {
    if username.is_empty() {
        return Err(RegisterError::MissingUsername);
    }
    if password.is_empty() {
        return Err(RegisterError::MissingPassword);
    }
    if confirmation.is_empty() {
        return Err(RegisterError::MissingConfirmation);
    }
    if password != confirmation {
        return Err(RegisterError::Mismatch);
    }
    if password.chars().count() < 8 {
        return Err(RegisterError::TooShort);
    }
    if !DIGIT.is_match(password) {
        return Err(RegisterError::NoDigit);
    }
    if !SPECIAL.is_match(password) {
        return Err(RegisterError::NoSpecialChar);
    }
    Ok(())
}

pub async fn find_by_username(state: &AppState, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, hash, cash FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(&state.db)
        .await
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    password: &str,
    confirmation: &str,
) -> Result<i64, RegisterError> {
    validate_registration(username, password, confirmation)?;

    if find_by_username(state, username).await?.is_some() {
        return Err(RegisterError::UsernameTaken);
    }

    let pw_hash = hash(password, state.settings.bcrypt_cost)?;

    let inserted = sqlx::query("INSERT INTO users (username, hash, cash) VALUES (?1, ?2, ?3)")
        .bind(username)
        .bind(&pw_hash)
        .bind(state.settings.starting_cash_cents)
        .execute(&state.db)
        .await;

    // a concurrent registration can still win the unique index
    let id = match inserted {
        Ok(r) => r.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(RegisterError::UsernameTaken);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = id, username, "user registered");
    Ok(id)
}

pub async fn login_user(state: &AppState, username: &str, password: &str) -> Result<User, LoginError> {
    if username.is_empty() {
        return Err(LoginError::MissingUsername);
    }
    if password.is_empty() {
        return Err(LoginError::MissingPassword);
    }

    let Some(user) = find_by_username(state, username).await? else {
        return Err(LoginError::InvalidCredentials);
    };

    if !verify(password, &user.hash).unwrap_or(false) {
        return Err(LoginError::InvalidCredentials);
    }

    tracing::info!(user_id = user.id, "user logged in");
    Ok(user)
}
