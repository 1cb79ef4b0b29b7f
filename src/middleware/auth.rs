use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{models::CurrentUser, services::session_service, AppState};

pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let part = part.trim();
        let mut it = part.splitn(2, '=');
        let (Some(k), Some(v)) = (it.next(), it.next()) else {
            continue;
        };
        if k.trim() == name {
            return Some(v.trim().to_string());
        }
    }
    None
}

pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie_name = state.settings.session_cookie_name.as_str();

    if let Some(session_id) = get_cookie(req.headers(), cookie_name).filter(|s| !s.is_empty()) {
        match session_service::current_user(&state, &session_id).await {
            // Store user in request extensions so handlers can access it
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "session lookup failed"),
        }
    }

    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    path == "/login"
        || path == "/register"
        || path == "/logout"
        || path == "/health"
        || path == "/health/db"
        || path == "/favicon.ico"
        || path.starts_with("/static/")
}

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path();

    if is_public_path(path) {
        return next.run(req).await;
    }

    // If inject_current_user already put CurrentUser in extensions => authenticated
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    Redirect::to("/login").into_response()
}

/// Responses are never cached; balances change on every trade.
pub async fn no_cache(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    res
}
