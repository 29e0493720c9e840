use askama::Template;
use axum::response::{IntoResponse, Response};

use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::Html;

#[derive(Template)]
#[template(path = "about/about.html")]
pub struct AboutTemplate {
    pub viewer: Option<CurrentUser>,
    pub heading: &'static str,
    pub author_name: Option<&'static str>,
    pub lines: Vec<&'static str>,
}

/// GET /about/author/
pub async fn author(MaybeUser(viewer): MaybeUser) -> Response {
    Html(AboutTemplate {
        viewer,
        heading: "About the author",
        author_name: Some("The Yatube team"),
        lines: vec![
            "Yatube is a small blogging platform for sharing posts and images.",
            "Write posts, collect them into groups and follow the authors you like.",
        ],
    })
    .into_response()
}

/// GET /about/tech/
pub async fn tech(MaybeUser(viewer): MaybeUser) -> Response {
    Html(AboutTemplate {
        viewer,
        heading: "Technologies",
        author_name: None,
        lines: vec![
            "Rust with axum and tokio",
            "askama templates",
            "SQLite through rusqlite and r2d2",
            "bcrypt password hashing and cookie sessions",
        ],
    })
    .into_response()
}
