use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Extractor that requires authentication.
/// Without a valid session the request is redirected to the login page with
/// `next` pointing back at the original path.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = session_user(parts, state)? {
            return Ok(user);
        }

        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Err(AppError::LoginRequired(login_redirect(
            &state.config.auth.login_url,
            next,
        )))
    }
}

/// Optional user extractor: returns None instead of redirecting when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_user(parts, state)?))
    }
}

fn session_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = session::cookie_value(&parts.headers, &state.config.auth.cookie_name) else {
        return Ok(None);
    };

    let conn = state.db.get()?;
    let user = session::lookup(&conn, token)?.map(|(id, username)| CurrentUser { id, username });
    Ok(user)
}

/// `login_url?next=<encoded path>`.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", login_url, encoded)
}
