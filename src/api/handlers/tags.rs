//! Handlers for tag endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::short_urls::split_comma_list;
use crate::api::dto::tags::{
    CreateTagsRequest, DeleteTagsParams, RenameTagRequest, TagsAffectedResponse, TagsListResponse,
};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /rest/tags`: every tag with the number of short URLs using it.
pub async fn list_tags_handler(
    State(state): State<AppState>,
) -> Result<Json<TagsListResponse>, AppError> {
    let tags = state.tag_service.list().await?;
    Ok(Json(TagsListResponse {
        data: tags.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /rest/tags`. Existing names are skipped; `affected` counts new ones.
pub async fn create_tags_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagsRequest>,
) -> Result<(StatusCode, Json<TagsAffectedResponse>), AppError> {
    let affected = state.tag_service.create(payload.tags).await?;
    Ok((StatusCode::CREATED, Json(TagsAffectedResponse { affected })))
}

/// Renames a tag.
///
/// # Endpoint
///
/// `PUT /rest/tags` with `{"old_name": "...", "new_name": "..."}`
///
/// # Errors
///
/// Returns 404 Not Found if `old_name` does not exist.
/// Returns 409 Conflict if `new_name` is already used.
pub async fn rename_tag_handler(
    State(state): State<AppState>,
    Json(payload): Json<RenameTagRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .tag_service
        .rename(&payload.old_name, &payload.new_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /rest/tags?tags=a,b`. Unknown names are ignored.
pub async fn delete_tags_handler(
    State(state): State<AppState>,
    Query(params): Query<DeleteTagsParams>,
) -> Result<Json<TagsAffectedResponse>, AppError> {
    let names = split_comma_list(params.tags.as_deref());
    let affected = state.tag_service.delete(names).await?;
    Ok(Json(TagsAffectedResponse { affected }))
}
