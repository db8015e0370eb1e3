//! Handler for single-step shortening via query string.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde_json::json;

use crate::api::dto::short_urls::{ShortUrlResponse, SingleStepParams};
use crate::application::services::CreateShortUrl;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL from query parameters, authenticating with `api_key`.
///
/// # Endpoint
///
/// `GET /rest/short-urls/shorten?api_key=...&long_url=...`
///
/// Meant for integrations that can only issue a GET. It sits outside the
/// authenticated router, so a bad key is a 400, not a 401.
///
/// # Errors
///
/// Returns 400 Bad Request if the key is missing or invalid, or the URL is
/// missing or invalid.
pub async fn single_step_handler(
    State(state): State<AppState>,
    Query(params): Query<SingleStepParams>,
) -> Result<Json<ShortUrlResponse>, AppError> {
    let key_is_valid = match params.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => state.api_key_service.check(key, Utc::now()).await?,
        _ => false,
    };

    if !key_is_valid {
        return Err(AppError::bad_request(
            "No API key was provided or it is not valid",
            json!({ "field": "api_key" }),
        ));
    }

    let long_url = params.long_url.unwrap_or_default();
    let created = state
        .short_url_service
        .create(CreateShortUrl::new(long_url))
        .await?;

    let public_url = state.short_url_service.short_url(&created.short_code);
    Ok(Json(ShortUrlResponse::new(created, public_url)))
}
