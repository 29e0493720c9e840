use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use crate::auth::session;
use crate::db::follows::{self, Direction, FollowStats};
use crate::db::models::{Profile, User};
use crate::db::posts::{self, PostCard, PostFilter};
use crate::db::profiles;
use crate::db::users::{self, AuthorSummary};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::ProfileForm;
use crate::pagination::Page;
use crate::routes::{segment, Html, PageQuery};
use crate::state::AppState;
use crate::uploads;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<CurrentUser>,
    pub author: User,
    pub profile: Profile,
    pub stats: FollowStats,
    pub post_count: i64,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "all_authors.html")]
pub struct AuthorsTemplate {
    pub viewer: Option<CurrentUser>,
    pub page: Page<AuthorSummary>,
}

#[derive(Template)]
#[template(path = "follow_list.html")]
pub struct FollowListTemplate {
    pub viewer: Option<CurrentUser>,
    pub heading: String,
    pub username: String,
    pub page: Page<String>,
}

#[derive(Template)]
#[template(path = "profile_settings.html")]
pub struct ProfileSettingsTemplate {
    pub viewer: Option<CurrentUser>,
    pub form: ProfileForm,
    pub current_image: Option<String>,
}

#[derive(Template)]
#[template(path = "user_delete.html")]
pub struct UserDeleteTemplate {
    pub viewer: Option<CurrentUser>,
    pub username: String,
}

fn profile_url(username: &str) -> String {
    format!("/{}/", segment(username))
}

/// GET /{username}/: the author's posts and follow counters.
pub async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::get_by_username(&conn, &username).map_err(AppError::or_not_found)?;
    let viewer_id = viewer.as_ref().map(|u| u.id);

    let profile = profiles::get_or_default(&conn, author.id)?;
    let stats = follows::stats(&conn, author.id, viewer_id)?;
    let post_count = posts::count(&conn, PostFilter::Author(author.id))?;
    let page = posts::list(
        &conn,
        PostFilter::Author(author.id),
        viewer_id,
        query.page(),
        state.config.pagination.posts_per_page,
    )?;

    Ok(Html(ProfileTemplate {
        viewer,
        author,
        profile,
        stats,
        post_count,
        page,
    })
    .into_response())
}

/// GET|POST /{username}/follow/: following yourself is ignored.
pub async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::get_by_username(&conn, &username).map_err(AppError::or_not_found)?;
    if follows::get_or_create(&conn, user.id, author.id)?.is_some() {
        tracing::debug!("{} follows {}", user.username, author.username);
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

/// GET|POST /{username}/unfollow/
pub async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::get_by_username(&conn, &username).map_err(AppError::or_not_found)?;
    if follows::delete(&conn, user.id, author.id)? > 0 {
        tracing::debug!("{} unfollowed {}", user.username, author.username);
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

async fn follow_list(
    state: AppState,
    viewer: Option<CurrentUser>,
    username: String,
    page: Option<String>,
    direction: Direction,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user = users::get_by_username(&conn, &username).map_err(AppError::or_not_found)?;
    let page = follows::list_users(
        &conn,
        user.id,
        direction,
        page.as_deref(),
        state.config.pagination.listing_per_page,
    )?;
    let heading = match direction {
        Direction::Following => format!("{} follows", user.username),
        Direction::Followers => format!("Followers of {}", user.username),
    };

    Ok(Html(FollowListTemplate {
        viewer,
        heading,
        username: user.username,
        page,
    })
    .into_response())
}

/// GET /following/{username}/
pub async fn following(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    follow_list(state, viewer, username, query.page, Direction::Following).await
}

/// GET /followers/{username}/
pub async fn followers(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    follow_list(state, viewer, username, query.page, Direction::Followers).await
}

/// GET /allauthors/
pub async fn all_authors(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let page = users::all_authors(&conn, query.page(), state.config.pagination.listing_per_page)?;
    Ok(Html(AuthorsTemplate { viewer, page }).into_response())
}

/// GET /profile-settings/
pub async fn settings_page(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let profile = profiles::get_or_default(&conn, user.id)?;
    Ok(Html(ProfileSettingsTemplate {
        viewer: Some(user),
        form: ProfileForm::from_bio(&profile.bio),
        current_image: profile.image,
    })
    .into_response())
}

/// POST /profile-settings/: multipart `bio` and optional `image`.
pub async fn update_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = ProfileForm::from_multipart(multipart).await?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(form) => {
            let conn = state.db.get()?;
            let current_image = profiles::get_or_default(&conn, user.id)?.image;
            return Ok(Html(ProfileSettingsTemplate {
                viewer: Some(user),
                form,
                current_image,
            })
            .into_response());
        }
    };

    let image = match &valid.image {
        Some(upload) => Some(uploads::save_image(&state.config.media_path(), "users", upload).await?),
        None => None,
    };
    let conn = state.db.get()?;
    profiles::upsert(&conn, user.id, &valid.bio, image.as_deref())?;
    tracing::info!("Profile of {} updated", user.username);

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

/// GET /{username}/delete/: confirmation page, account owner only.
pub async fn delete_page(user: CurrentUser, Path(username): Path<String>) -> AppResult<Response> {
    if user.username != username {
        return Err(AppError::NotFound);
    }
    Ok(Html(UserDeleteTemplate {
        viewer: Some(user),
        username,
    })
    .into_response())
}

/// POST /{username}/delete/: removes the account and signs out.
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    if user.username != username {
        return Err(AppError::NotFound);
    }
    let conn = state.db.get()?;
    users::delete(&conn, user.id)?;
    tracing::info!("User {} deleted their account", user.username);

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session::clear_session_cookie(&state.config.auth.cookie_name),
        )]),
        Redirect::to("/"),
    )
        .into_response())
}
