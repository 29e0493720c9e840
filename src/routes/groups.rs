use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::db::groups::{self, GroupFields, GroupSummary};
use crate::db::models::Group;
use crate::db::posts::{self, PostCard, PostFilter};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{GroupForm, ValidGroup};
use crate::pagination::Page;
use crate::routes::{segment, Html, PageQuery};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub viewer: Option<CurrentUser>,
    pub group: Group,
    pub creator: Option<String>,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "all_groups.html")]
pub struct GroupListTemplate {
    pub viewer: Option<CurrentUser>,
    pub heading: String,
    pub page: Page<GroupSummary>,
}

#[derive(Template)]
#[template(path = "new_group.html")]
pub struct GroupFormTemplate {
    pub viewer: Option<CurrentUser>,
    pub form: GroupForm,
    pub is_edit: bool,
    pub action: String,
}

fn group_url(slug: &str) -> String {
    format!("/group/{}/", segment(slug))
}

fn fields(valid: &ValidGroup) -> GroupFields<'_> {
    GroupFields {
        title: &valid.title,
        slug: &valid.slug,
        description: valid.description.as_deref(),
    }
}

/// The group at `slug`, provided `user` is `username` and created it.
fn owned_group(
    conn: &rusqlite::Connection,
    user: &CurrentUser,
    username: &str,
    slug: &str,
) -> AppResult<Group> {
    if user.username != username {
        return Err(AppError::NotFound);
    }
    let group = groups::get_by_slug(conn, slug).map_err(AppError::or_not_found)?;
    if group.creator_id != Some(user.id) {
        return Err(AppError::NotFound);
    }
    Ok(group)
}

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = groups::get_by_slug(&conn, &slug).map_err(AppError::or_not_found)?;
    let creator = match group.creator_id {
        Some(id) => users::find_by_id(&conn, id)?.map(|u| u.username),
        None => None,
    };
    let page = posts::list(
        &conn,
        PostFilter::Group(group.id),
        viewer.as_ref().map(|u| u.id),
        query.page(),
        state.config.pagination.posts_per_page,
    )?;

    Ok(Html(GroupTemplate {
        viewer,
        group,
        creator,
        page,
    })
    .into_response())
}

/// GET /allgroups/
pub async fn all_groups(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let page = groups::list_all(&conn, query.page(), state.config.pagination.listing_per_page)?;
    Ok(Html(GroupListTemplate {
        viewer,
        heading: "All groups".to_string(),
        page,
    })
    .into_response())
}

/// GET /{username}/groups/: groups the user created.
pub async fn author_groups(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::get_by_username(&conn, &username).map_err(AppError::or_not_found)?;
    let page = groups::list_by_creator(
        &conn,
        author.id,
        query.page(),
        state.config.pagination.listing_per_page,
    )?;
    Ok(Html(GroupListTemplate {
        viewer,
        heading: format!("Groups by {}", author.username),
        page,
    })
    .into_response())
}

/// GET /newgroup/
pub async fn new_group_page(user: CurrentUser) -> AppResult<Response> {
    Ok(Html(GroupFormTemplate {
        viewer: Some(user),
        form: GroupForm::default(),
        is_edit: false,
        action: "/newgroup/".to_string(),
    })
    .into_response())
}

/// POST /newgroup/: the viewer becomes the group's creator.
pub async fn new_group(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<GroupForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let valid = match form.validate(&conn, None)? {
        Ok(valid) => valid,
        Err(form) => {
            return Ok(Html(GroupFormTemplate {
                viewer: Some(user),
                form,
                is_edit: false,
                action: "/newgroup/".to_string(),
            })
            .into_response())
        }
    };

    let group_id = groups::create(&conn, &fields(&valid), user.id)?;
    tracing::info!("Group {} ({}) created by {}", group_id, valid.slug, user.username);

    Ok(Redirect::to(&group_url(&valid.slug)).into_response())
}

/// GET /{username}/{slug}/edit/: creator only.
pub async fn edit_page(
    state: &AppState,
    user: CurrentUser,
    username: &str,
    slug: &str,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = owned_group(&conn, &user, username, slug)?;
    Ok(Html(GroupFormTemplate {
        viewer: Some(user),
        form: GroupForm::from_group(&group),
        is_edit: true,
        action: format!("/{}/{}/edit/", segment(username), segment(&group.slug)),
    })
    .into_response())
}

/// POST /{username}/{slug}/edit/: creator only; a changed slug must still be
/// unique.
pub async fn edit(
    state: &AppState,
    user: CurrentUser,
    username: &str,
    slug: &str,
    form: GroupForm,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = owned_group(&conn, &user, username, slug)?;

    let valid = match form.validate(&conn, Some(group.id))? {
        Ok(valid) => valid,
        Err(form) => {
            return Ok(Html(GroupFormTemplate {
                viewer: Some(user),
                form,
                is_edit: true,
                action: format!("/{}/{}/edit/", segment(username), segment(&group.slug)),
            })
            .into_response())
        }
    };

    groups::update(&conn, group.id, &fields(&valid))?;
    tracing::info!("Group {} edited by {}", group.id, user.username);

    Ok(Redirect::to(&group_url(&valid.slug)).into_response())
}

/// GET|POST /{username}/{slug}/delete/: creator only. Posts stay, without
/// a group.
pub async fn group_delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, slug)): Path<(String, String)>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = owned_group(&conn, &user, &username, &slug)?;
    groups::delete(&conn, group.id)?;
    tracing::info!("Group {} deleted by {}", group.slug, user.username);

    Ok(Redirect::to(&format!("/{}/groups/", segment(&username))).into_response())
}
