use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{LoginForm, SignupForm};
use crate::routes::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<CurrentUser>,
    pub form: SignupForm,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<CurrentUser>,
    pub form: LoginForm,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Starts a session for the user and redirects to `target` with the cookie set.
fn signed_in(state: &AppState, user_id: i64, target: &str) -> AppResult<Response> {
    let conn = state.db.get()?;
    let hours = state.config.auth.session_hours;
    let token = session::create_session(&conn, user_id, hours)?;
    let cookie = session::session_cookie(&state.config.auth.cookie_name, &token, hours);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(target),
    )
        .into_response())
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_page(MaybeUser(viewer): MaybeUser) -> Response {
    Html(SignupTemplate {
        viewer,
        form: SignupForm::default(),
    })
    .into_response()
}

/// POST /auth/signup/: creates the account and signs it in.
pub async fn signup(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let valid = {
        let conn = state.db.get()?;
        match form.validate(&conn)? {
            Ok(valid) => valid,
            Err(form) => return Ok(Html(SignupTemplate { viewer, form }).into_response()),
        }
    };

    let cost = state.config.auth.bcrypt_cost;
    let secret = valid.password;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&secret, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

    let created = {
        let conn = state.db.get()?;
        users::try_create(&conn, &valid.username, &hash)?
    };
    let Some(user_id) = created else {
        let form = SignupForm::taken(valid.username);
        return Ok(Html(SignupTemplate { viewer, form }).into_response());
    };
    tracing::info!("New user {} signed up", valid.username);

    signed_in(&state, user_id, "/")
}

// -- Login --

/// GET /auth/login/?next=
pub async fn login_page(
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Response {
    Html(LoginTemplate {
        viewer,
        form: LoginForm::with_next(query.next),
    })
    .into_response()
}

/// POST /auth/login/: checks credentials, then follows a local `next`.
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = {
        let conn = state.db.get()?;
        users::find_by_username(&conn, form.username.trim())?
    };

    let user = match user {
        Some(user) => {
            let candidate = form.password.clone();
            let stored = user.password_hash.clone();
            let ok = tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored))
                .await
                .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?;
            ok.then_some(user)
        }
        None => None,
    };

    let Some(user) = user else {
        tracing::debug!("Rejected login for {}", form.username.trim());
        return Ok(Html(LoginTemplate {
            viewer,
            form: form.reject(),
        })
        .into_response());
    };

    tracing::info!("User {} logged in", user.username);
    signed_in(&state, user.id, form.redirect_target())
}

// -- Logout --

/// GET|POST /auth/logout/: ends the current session, if any.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = session::cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie(cookie_name))]),
        Redirect::to("/"),
    )
        .into_response())
}
