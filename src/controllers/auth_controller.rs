use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::CurrentUser,
    render,
    services::{auth_service, session_service},
    AppState,
};

// Forget whoever was logged in on this browser.
async fn forget_session(state: &AppState, jar: &CookieJar) {
    let Some(cookie) = jar.get(&state.settings.session_cookie_name) else {
        return;
    };
    if cookie.value().is_empty() {
        return;
    }
    if let Err(e) = session_service::destroy_session(state, cookie.value()).await {
        tracing::warn!(error = %e, "could not destroy session");
    }
}

// Starts a session for `user_id`, sets the cookie and redirects home.
async fn sign_in(state: &AppState, jar: CookieJar, user_id: i64) -> Response {
    match session_service::create_session(state, user_id).await {
        Ok(session_id) => {
            let jar = jar.add(auth_service::auth_cookie(state, session_id));
            (jar, Redirect::to("/")).into_response()
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "could not create session");
            render::apology(state, &format!("An error occurred: {e}"), StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}

// ---------------- LOGIN ----------------

pub async fn get_login(State(state): State<AppState>, jar: CookieJar) -> Response {
    forget_session(&state, &jar).await;
    let jar = jar.add(auth_service::clear_auth_cookie(&state));

    (jar, render::page(&state, StatusCode::OK, "pages/login", "Log In", &json!({}), None, None)).into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    forget_session(&state, &jar).await;

    let username = form.username.trim();

    match auth_service::login_user(&state, username, &form.password).await {
        Ok(user) => sign_in(&state, jar, user.id).await,
        Err(e) => {
            let jar = jar.add(auth_service::clear_auth_cookie(&state));
            (jar, render::apology(&state, &e.to_string(), e.status(), None)).into_response()
        }
    }
}

// ---------------- REGISTER ----------------

pub async fn get_register(State(state): State<AppState>, jar: CookieJar) -> Response {
    forget_session(&state, &jar).await;
    let jar = jar.add(auth_service::clear_auth_cookie(&state));

    (jar, render::page(&state, StatusCode::OK, "pages/register", "Register", &json!({}), None, None)).into_response()
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

pub async fn post_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    forget_session(&state, &jar).await;

    let username = form.username.trim();

    match auth_service::register_user(&state, username, &form.password, &form.confirmation).await {
        Ok(user_id) => sign_in(&state, jar, user_id).await,
        Err(e) => {
            let jar = jar.add(auth_service::clear_auth_cookie(&state));
            (jar, render::apology(&state, &e.to_string(), e.status(), None)).into_response()
        }
    }
}

// ---------------- LOGOUT ----------------

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    if let Some(Extension(u)) = user {
        tracing::info!(user_id = u.id, "user logged out");
    }
    forget_session(&state, &jar).await;

    let jar = jar.add(auth_service::clear_auth_cookie(&state));
    (jar, Redirect::to("/"))
}
