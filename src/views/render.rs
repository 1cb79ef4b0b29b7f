use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::{models::CurrentUser, AppState};

/// Formats cents as US dollars, e.g. `-$1,234.50`.
pub fn usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let rem = abs % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{rem:02}")
}

pub fn render_full(
    state: &AppState,
    title: &str,
    body_html: String,
    user: Option<&CurrentUser>,
    flash: Option<String>,
) -> Result<String, String> {
    let (is_logged_in, user_json) = match user {
        Some(u) => (
            true,
            json!({
                "id": u.id,
                "username": u.username,
            }),
        ),
        None => (false, serde_json::Value::Null),
    };

    let ctx = json!({
        "title": title,
        "body": body_html,
        "is_logged_in": is_logged_in,
        "user": user_json,
        "flash": flash,
    });

    state
        .hbs
        .render("layouts/base", &ctx)
        .map_err(|e| e.to_string())
}

/// Renders `template` with `ctx` inside the base layout.
pub fn page<T: Serialize>(
    state: &AppState,
    status: StatusCode,
    template: &str,
    title: &str,
    ctx: &T,
    user: Option<&CurrentUser>,
    flash: Option<String>,
) -> Response {
    let body = match state.hbs.render(template, ctx) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(template, error = %e, "template error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("template error: {e}")),
            )
                .into_response();
        }
    };

    match render_full(state, title, body, user, flash) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}

/// Generic error page carrying the message and status code.
pub fn apology(state: &AppState, message: &str, status: StatusCode, user: Option<&CurrentUser>) -> Response {
    page(
        state,
        status,
        "pages/apology",
        "Apology",
        &json!({ "message": message, "code": status.as_u16() }),
        user,
        None,
    )
}
