use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};

use crate::db::{likes, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::posts::{parse_id, post_url};
use crate::state::AppState;

/// GET /{username}/{post_id}/like/: likes the post, or takes the like back.
pub async fn toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let post = posts::get_by_author(&conn, &username, post_id).map_err(AppError::or_not_found)?;

    let liked = likes::toggle(&conn, user.id, post.id)?;
    tracing::debug!("{} {} post {}", user.username, if liked { "liked" } else { "unliked" }, post.id);

    Ok(Redirect::to(&post_url(&username, post.id)).into_response())
}
