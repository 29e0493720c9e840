use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Form;

use crate::db::posts as post_queries;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::forms::GroupForm;
use crate::routes::{groups, posts};
use crate::state::AppState;

/// GET|POST /{username}/{key}/edit/
///
/// Post and group edit pages share this path. A key naming one of the
/// author's posts by id edits that post; any other key is a group slug.
pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, key)): Path<(String, String)>,
    request: Request,
) -> AppResult<Response> {
    let post_id = match key.parse::<i64>() {
        Ok(id) => {
            let conn = state.db.get()?;
            post_queries::exists_for_author(&conn, &username, id)?.then_some(id)
        }
        Err(_) => None,
    };
    let submitted = request.method() == Method::POST;

    match (post_id, submitted) {
        (Some(id), false) => posts::edit_page(&state, user, &username, id).await,
        (Some(id), true) => {
            let multipart = match Multipart::from_request(request, &state).await {
                Ok(multipart) => multipart,
                Err(rejection) => return Ok(rejection.into_response()),
            };
            posts::edit(&state, user, &username, id, multipart).await
        }
        (None, false) => groups::edit_page(&state, user, &username, &key).await,
        (None, true) => {
            let form = match Form::<GroupForm>::from_request(request, &state).await {
                Ok(Form(form)) => form,
                Err(rejection) => return Ok(rejection.into_response()),
            };
            groups::edit(&state, user, &username, &key, form).await
        }
    }
}
