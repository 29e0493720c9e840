use askama::Template;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::Html;

#[derive(Template)]
#[template(path = "misc/404.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<CurrentUser>,
    pub path: Option<String>,
}

impl NotFoundTemplate {
    pub fn new(path: Option<String>) -> Self {
        Self { viewer: None, path }
    }
}

#[derive(Template, Default)]
#[template(path = "misc/500.html")]
pub struct ServerErrorTemplate {
    pub viewer: Option<CurrentUser>,
}

/// Router fallback for paths no route matches.
pub async fn not_found(MaybeUser(viewer): MaybeUser, uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    let page = NotFoundTemplate {
        viewer,
        path: Some(uri.path().to_string()),
    };
    (StatusCode::NOT_FOUND, Html(page)).into_response()
}
