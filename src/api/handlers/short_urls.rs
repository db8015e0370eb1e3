//! Handlers for short URL management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::api::dto::pagination::PaginationMeta;
use crate::api::dto::short_urls::{
    CreateShortUrlRequest, EditShortUrlRequest, ListShortUrlsParams, SetTagsRequest,
    ShortUrlResponse, ShortUrlsListResponse,
};
use crate::domain::entities::ShortUrl;
use crate::error::AppError;
use crate::state::AppState;

fn to_response(state: &AppState, short_url: ShortUrl) -> ShortUrlResponse {
    let public_url = state.short_url_service.short_url(&short_url.short_code);
    ShortUrlResponse::new(short_url, public_url)
}

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /rest/short-urls`
///
/// # Request Body
///
/// ```json
/// {
///   "long_url": "https://example.com/page",
///   "custom_slug": "my-page",
///   "valid_since": "2026-01-01T00:00:00Z",
///   "valid_until": null,
///   "max_visits": 100,
///   "tags": ["docs"]
/// }
/// ```
///
/// Only `long_url` is required.
///
/// # Errors
///
/// Returns 400 Bad Request on an invalid URL, slug or metadata.
/// Returns 409 Conflict if the custom slug is taken.
pub async fn create_short_url_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateShortUrlRequest>,
) -> Result<Json<ShortUrlResponse>, AppError> {
    payload.validate()?;

    let created = state.short_url_service.create(payload.into()).await?;
    Ok(Json(to_response(&state, created)))
}

/// Lists short URLs.
///
/// # Endpoint
///
/// `GET /rest/short-urls`
///
/// # Query Parameters
///
/// - `page`, `items_per_page`: pagination (defaults 1 and 10)
/// - `search_term`: matches long URL, short code or tag name
/// - `tags`: comma-separated, every tag must be present
/// - `order_by`: `field` or `field-ASC|DESC`, field one of
///   `long_url`, `short_code`, `date_created`, `visits`
///
/// Page and total count are fetched concurrently.
pub async fn list_short_urls_handler(
    State(state): State<AppState>,
    Query(params): Query<ListShortUrlsParams>,
) -> Result<Json<ShortUrlsListResponse>, AppError> {
    let (offset, limit) = params
        .pagination
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let query = params.to_query(offset, limit);
    let (short_urls, total) = tokio::try_join!(
        state.short_url_service.list(query.clone()),
        state.short_url_service.count(&query),
    )?;

    let pagination = PaginationMeta::new(&params.pagination, short_urls.len(), total);
    let data = short_urls
        .into_iter()
        .map(|s| to_response(&state, s))
        .collect();

    Ok(Json(ShortUrlsListResponse { data, pagination }))
}

/// Returns one short URL if it is currently resolvable.
///
/// # Endpoint
///
/// `GET /rest/short-urls/{short_code}`
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, outside its validity window
/// or has reached its visit cap.
pub async fn get_short_url_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Json<ShortUrlResponse>, AppError> {
    let short_url = state
        .short_url_service
        .resolve(&short_code, Utc::now())
        .await?;
    Ok(Json(to_response(&state, short_url)))
}

/// Edits validity window and visit cap.
///
/// `PUT /rest/short-urls/{short_code}`. Responds 204 No Content.
pub async fn edit_short_url_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    Json(payload): Json<EditShortUrlRequest>,
) -> Result<StatusCode, AppError> {
    state
        .short_url_service
        .update_metadata(&short_code, payload.into())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the tag set of a short URL.
///
/// `PUT /rest/short-urls/{short_code}/tags`
pub async fn set_short_url_tags_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    Json(payload): Json<SetTagsRequest>,
) -> Result<Json<ShortUrlResponse>, AppError> {
    let updated = state
        .short_url_service
        .set_tags(&short_code, payload.tags)
        .await?;
    Ok(Json(to_response(&state, updated)))
}

/// `DELETE /rest/short-urls/{short_code}`. Visits are removed with it.
pub async fn delete_short_url_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.short_url_service.delete(&short_code).await?;
    Ok(StatusCode::NO_CONTENT)
}
