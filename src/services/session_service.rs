use chrono::Utc;
use uuid::Uuid;

use crate::{models::CurrentUser, AppState};

/// Creates a server-side session for `user_id` and returns its opaque id.
/// Sessions that have already expired are purged first.
pub async fn create_session(state: &AppState, user_id: i64) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = (now + state.settings.session_ttl).timestamp();

    let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now.timestamp())
        .execute(&state.db)
        .await?
        .rows_affected();
    if purged > 0 {
        tracing::debug!(purged, "purged expired sessions");
    }

    sqlx::query("INSERT INTO sessions (id, user_id, flash, created_at, expires_at) VALUES (?1, ?2, NULL, ?3, ?4)")
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&state.db)
        .await?;

    Ok(id)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub async fn current_user(state: &AppState, session_id: &str) -> Result<Option<CurrentUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, String)>(
        "SELECT u.id, u.username FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.id = ?1 AND s.expires_at > ?2",
    )
    .bind(session_id)
    .bind(Utc::now().timestamp())
    .fetch_optional(&state.db)
    .await?;

    Ok(row.map(|(id, username)| CurrentUser {
        id,
        username,
        session_id: session_id.to_string(),
    }))
}

pub async fn set_flash(state: &AppState, session_id: &str, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sessions SET flash = ?1 WHERE id = ?2")
        .bind(message)
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

/// Returns the pending flash message, clearing it.
pub async fn take_flash(state: &AppState, session_id: &str) -> Result<Option<String>, sqlx::Error> {
    let mut tx = state.db.begin().await?;

    // write first so the transaction holds the write lock before it reads
    sqlx::query("UPDATE sessions SET flash = flash WHERE id = ?1")
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

    let flash = sqlx::query_scalar::<_, Option<String>>("SELECT flash FROM sessions WHERE id = ?1")
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .flatten();

    if flash.is_some() {
        sqlx::query("UPDATE sessions SET flash = NULL WHERE id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(flash)
}
