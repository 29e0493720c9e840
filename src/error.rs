use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::routes::errors::{NotFoundTemplate, ServerErrorTemplate};
use crate::routes::Html;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// The route needs a signed-in user; carries the login URL with `next`.
    #[error("Login required")]
    LoginRequired(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps `QueryReturnedNoRows` to `NotFound`, keeps other errors as they are.
    pub fn or_not_found(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(NotFoundTemplate::new(None))).into_response()
            }
            AppError::LoginRequired(location) => Redirect::to(&location).into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                msg,
            )
                .into_response(),
            // Oversized or malformed upload bodies are the client's fault.
            AppError::Multipart(err) => {
                tracing::debug!("rejected multipart body: {}", err);
                (err.status(), err.body_text()).into_response()
            }
            other => {
                tracing::error!("{}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(ServerErrorTemplate::default()),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn login_required_redirects_to_login() {
        let response = AppError::LoginRequired("/auth/login/?next=%2Fnew%2F".into()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fnew%2F"
        );
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn broken_multipart_body_is_a_client_error() {
        use axum::extract::{FromRequest, Multipart};

        let request = axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=abc")
            .body(axum::body::Body::from("garbage without boundary"))
            .unwrap();
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();
        let err = multipart.next_field().await.unwrap_err();
        assert_eq!(response_status(err.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let err = AppError::or_not_found(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, AppError::NotFound));
        let err = AppError::or_not_found(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, AppError::Database(_)));
    }
}
