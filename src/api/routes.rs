//! REST API route configuration, mounted under `/rest`.
//!
//! Everything except single-step shortening requires an API key via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_api_key_handler, create_short_url_handler, create_tags_handler,
    delete_short_url_handler, delete_tags_handler, disable_api_key_handler,
    edit_short_url_handler, get_short_url_handler, list_api_keys_handler,
    list_short_urls_handler, list_tags_handler, rename_tag_handler, set_short_url_tags_handler,
    single_step_handler, visits_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Routes authenticated by the `api_key` query parameter instead of a header.
///
/// - `GET /short-urls/shorten` - Single-step shortening
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/short-urls/shorten", get(single_step_handler))
}

/// Short URL, visit and tag routes.
///
/// # Endpoints
///
/// - `GET    /short-urls`                     - List with search, tag filter and ordering
/// - `POST   /short-urls`                     - Create
/// - `GET    /short-urls/{short_code}`        - Resolve
/// - `PUT    /short-urls/{short_code}`        - Edit validity window and visit cap
/// - `DELETE /short-urls/{short_code}`        - Delete
/// - `PUT    /short-urls/{short_code}/tags`   - Replace tags
/// - `GET    /short-urls/{short_code}/visits` - Paginated visits
/// - `GET|POST|PUT|DELETE /tags`              - List, create, rename, delete tags
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/short-urls",
            get(list_short_urls_handler).post(create_short_url_handler),
        )
        .route(
            "/short-urls/{short_code}",
            get(get_short_url_handler)
                .put(edit_short_url_handler)
                .delete(delete_short_url_handler),
        )
        .route(
            "/short-urls/{short_code}/tags",
            put(set_short_url_tags_handler),
        )
        .route("/short-urls/{short_code}/visits", get(visits_handler))
        .route(
            "/tags",
            get(list_tags_handler)
                .post(create_tags_handler)
                .put(rename_tag_handler)
                .delete(delete_tags_handler),
        )
}

/// API key management, kept apart for a stricter rate limit.
///
/// - `GET  /api-keys`         - List keys
/// - `POST /api-keys`         - Generate a key
/// - `POST /api-keys/disable` - Disable a key
pub fn key_management_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(list_api_keys_handler).post(create_api_key_handler),
        )
        .route("/api-keys/disable", post(disable_api_key_handler))
}
