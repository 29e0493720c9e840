use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::db::{comments, posts as post_queries};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::forms::CommentForm;
use crate::routes::posts::{parse_id, post_page, post_url};
use crate::routes::Html;
use crate::state::AppState;

/// GET /{username}/{post_id}/comment/: the post page with the form open.
pub async fn comment_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let page = post_page(&conn, Some(user), &username, post_id, CommentForm::default(), true)?;
    Ok(Html(page).into_response())
}

/// POST /{username}/{post_id}/comment/
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let post = post_queries::get_by_author(&conn, &username, post_id)
        .map_err(AppError::or_not_found)?;

    match form.validate() {
        Ok(text) => {
            let comment = comments::create(&conn, post.id, user.id, &text)?;
            tracing::info!("Comment {} on post {} by {}", comment.id, post.id, user.username);
            Ok(Redirect::to(&post_url(&username, post.id)).into_response())
        }
        Err(form) => {
            let page = post_page(&conn, Some(user), &username, post.id, form, true)?;
            Ok(Html(page).into_response())
        }
    }
}
