use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::routes::{self, about, assets, comments, edit, errors, groups, likes, posts, profiles};
use crate::state::AppState;

/// Largest accepted request body; image uploads are the big ones.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// The full site. Fixed top-level paths take priority over `/{username}/…`,
/// which is why those names are reserved at signup.
pub fn build_router(state: AppState) -> Router {
    let media = ServeDir::new(state.config.media_path());

    Router::new()
        .route("/", get(posts::index))
        .route("/search/", get(posts::search))
        .route("/follow/", get(posts::follow_index))
        .route("/new/", get(posts::new_post_page).post(posts::new_post))
        .route("/allgroups/", get(groups::all_groups))
        .route("/group/{slug}/", get(groups::group_posts))
        .route("/newgroup/", get(groups::new_group_page).post(groups::new_group))
        .route("/allauthors/", get(profiles::all_authors))
        .route("/following/{username}/", get(profiles::following))
        .route("/followers/{username}/", get(profiles::followers))
        .route(
            "/profile-settings/",
            get(profiles::settings_page).post(profiles::update_settings),
        )
        .route("/about/author/", get(about::author))
        .route("/about/tech/", get(about::tech))
        .route("/static/{*path}", get(assets::serve))
        .nest_service("/media", media)
        .merge(routes::auth::router())
        .route("/{username}/", get(profiles::profile))
        .route("/{username}/follow/", get(profiles::follow).post(profiles::follow))
        .route(
            "/{username}/unfollow/",
            get(profiles::unfollow).post(profiles::unfollow),
        )
        .route("/{username}/groups/", get(groups::author_groups))
        .route(
            "/{username}/delete/",
            get(profiles::delete_page).post(profiles::delete_user),
        )
        .route("/{username}/{key}/", get(posts::post_view))
        .route("/{username}/{key}/edit/", get(edit::edit).post(edit::edit))
        .route(
            "/{username}/{key}/comment/",
            get(comments::comment_page).post(comments::add_comment),
        )
        .route(
            "/{username}/{key}/post_delete/",
            get(posts::post_delete).post(posts::post_delete),
        )
        .route(
            "/{username}/{key}/delete/",
            get(groups::group_delete).post(groups::group_delete),
        )
        .route("/{username}/{key}/like/", get(likes::toggle))
        .fallback(errors::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
