use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use rusqlite::Connection;
use serde::Deserialize;

use crate::cache::PageCache;
use crate::db::comments::{self, CommentView};
use crate::db::follows::{self, FollowStats};
use crate::db::models::User;
use crate::db::posts::{self, NewPost, PostCard, PostFilter};
use crate::db::{groups, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{CommentForm, PostForm};
use crate::pagination::{Page, Paginator};
use crate::routes::{segment, Html, PageQuery};
use crate::state::AppState;
use crate::uploads;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer: Option<CurrentUser>,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub viewer: Option<CurrentUser>,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub viewer: Option<CurrentUser>,
    pub query: String,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub viewer: Option<CurrentUser>,
    pub label: String,
    pub post: PostCard,
    pub author: User,
    pub stats: FollowStats,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    pub show_form: bool,
}

/// One entry of the group drop-down on the post form.
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<CurrentUser>,
    pub form: PostForm,
    pub choices: Vec<GroupChoice>,
    pub is_edit: bool,
    pub action: String,
    pub current_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
}

/// Numeric path segments that fail to parse address nothing.
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse().map_err(|_| AppError::NotFound)
}

pub(crate) fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", segment(username), post_id)
}

fn group_choices(conn: &Connection, form: &PostForm) -> AppResult<Vec<GroupChoice>> {
    let choices = groups::all(conn)?
        .into_iter()
        .map(|group| GroupChoice {
            selected: form.is_selected(group.id),
            id: group.id,
            title: group.title,
        })
        .collect();
    Ok(choices)
}

fn form_page(
    conn: &Connection,
    viewer: CurrentUser,
    form: PostForm,
    edit: Option<(&str, i64, Option<String>)>,
) -> AppResult<Response> {
    let choices = group_choices(conn, &form)?;
    let (is_edit, action, current_image) = match edit {
        Some((username, post_id, image)) => {
            (true, format!("{}edit/", post_url(username, post_id)), image)
        }
        None => (false, "/new/".to_string(), None),
    };
    Ok(Html(PostFormTemplate {
        viewer: Some(viewer),
        form,
        choices,
        is_edit,
        action,
        current_image,
    })
    .into_response())
}

/// The post page: card, author stats, comments and the comment form.
pub(crate) fn post_page(
    conn: &Connection,
    viewer: Option<CurrentUser>,
    username: &str,
    post_id: i64,
    form: CommentForm,
    show_form: bool,
) -> AppResult<PostTemplate> {
    let viewer_id = viewer.as_ref().map(|u| u.id);
    let post = posts::card(conn, username, post_id, viewer_id).map_err(AppError::or_not_found)?;
    let author = users::get_by_username(conn, username).map_err(AppError::or_not_found)?;
    let stats = follows::stats(conn, author.id, viewer_id)?;
    let comments = comments::for_post(conn, post_id)?;

    Ok(PostTemplate {
        viewer,
        label: post.label(),
        post,
        author,
        stats,
        comments,
        form,
        show_form,
    })
}

/// GET /: latest posts. Rendered pages are cached per viewer and page.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let viewer_id = viewer.as_ref().map(|u| u.id);
    let key = PageCache::key("/", viewer_id, query.page().unwrap_or("1"));
    if let Some(body) = state.page_cache.get(&key) {
        return Ok(axum::response::Html(body).into_response());
    }

    let conn = state.db.get()?;
    let page = posts::list(
        &conn,
        PostFilter::All,
        viewer_id,
        query.page(),
        state.config.pagination.posts_per_page,
    )?;
    let body = IndexTemplate { viewer, page }.render()?;
    state.page_cache.insert(key, body.clone());

    Ok(axum::response::Html(body).into_response())
}

/// GET /follow/: posts by authors the viewer follows.
pub async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let page = posts::list(
        &conn,
        PostFilter::FollowedBy(user.id),
        Some(user.id),
        query.page(),
        state.config.pagination.posts_per_page,
    )?;
    Ok(Html(FollowTemplate {
        viewer: Some(user),
        page,
    })
    .into_response())
}

/// GET /search/?q=: posts whose text, author or group matches `q`.
pub async fn search(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Response> {
    let needle = query.q.as_deref().unwrap_or_default().trim().to_string();
    let per_page = state.config.pagination.posts_per_page;

    let page = if needle.is_empty() {
        Page::new(Vec::new(), Paginator::new(0, per_page).get_page(None))
    } else {
        let conn = state.db.get()?;
        posts::list(
            &conn,
            PostFilter::Search(&needle),
            viewer.as_ref().map(|u| u.id),
            query.page.as_deref(),
            per_page,
        )?
        .with_query(&[("q", needle.as_str())])
    };

    Ok(Html(SearchTemplate {
        viewer,
        query: needle,
        page,
    })
    .into_response())
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let page = post_page(&conn, viewer, &username, post_id, CommentForm::default(), false)?;
    Ok(Html(page).into_response())
}

/// GET /new/
pub async fn new_post_page(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    form_page(&conn, user, PostForm::default(), None)
}

/// POST /new/: multipart `text`, `group`, `image`.
pub async fn new_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = PostForm::from_multipart(multipart).await?;
    let conn = state.db.get()?;

    let valid = match form.validate(&conn)? {
        Ok(valid) => valid,
        Err(form) => return form_page(&conn, user, form, None),
    };

    let image = match &valid.image {
        Some(upload) => Some(uploads::save_image(&state.config.media_path(), "posts", upload).await?),
        None => None,
    };

    let post_id = posts::create(
        &conn,
        &NewPost {
            text: &valid.text,
            author_id: user.id,
            group_id: valid.group_id,
            image: image.as_deref(),
        },
    )?;
    tracing::info!("Post {} created by {}", post_id, user.username);

    Ok(Redirect::to("/").into_response())
}

/// GET /{username}/{post_id}/edit/: author only.
pub async fn edit_page(
    state: &AppState,
    user: CurrentUser,
    username: &str,
    post_id: i64,
) -> AppResult<Response> {
    if user.username != username {
        return Err(AppError::NotFound);
    }
    let conn = state.db.get()?;
    let post = posts::get_by_author(&conn, username, post_id).map_err(AppError::or_not_found)?;
    let form = PostForm::from_post(&post.text, post.group_id);
    form_page(&conn, user, form, Some((username, post_id, post.image)))
}

/// POST /{username}/{post_id}/edit/: author only; a new image replaces the
/// stored one, no image keeps it.
pub async fn edit(
    state: &AppState,
    user: CurrentUser,
    username: &str,
    post_id: i64,
    multipart: Multipart,
) -> AppResult<Response> {
    if user.username != username {
        return Err(AppError::NotFound);
    }
    let conn = state.db.get()?;
    let post = posts::get_by_author(&conn, username, post_id).map_err(AppError::or_not_found)?;

    let form = PostForm::from_multipart(multipart).await?;
    let valid = match form.validate(&conn)? {
        Ok(valid) => valid,
        Err(form) => return form_page(&conn, user, form, Some((username, post_id, post.image))),
    };

    let image = match &valid.image {
        Some(upload) => Some(uploads::save_image(&state.config.media_path(), "posts", upload).await?),
        None => None,
    };
    posts::update(&conn, post_id, &valid.text, valid.group_id, image.as_deref())?;
    tracing::info!("Post {} edited by {}", post_id, user.username);

    Ok(Redirect::to(&post_url(username, post_id)).into_response())
}

/// GET|POST /{username}/{post_id}/post_delete/: author only.
pub async fn post_delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    if user.username != username {
        return Err(AppError::NotFound);
    }
    let conn = state.db.get()?;
    let post = posts::get_by_author(&conn, &username, post_id).map_err(AppError::or_not_found)?;
    posts::delete(&conn, post.id)?;
    tracing::info!("Post {} deleted by {}", post.id, user.username);

    Ok(Redirect::to("/").into_response())
}
