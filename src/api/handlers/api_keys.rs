//! Handlers for API key management.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use crate::api::dto::api_keys::{
    ApiKeyCreatedResponse, ApiKeyResponse, ApiKeysListResponse, CreateApiKeyRequest,
    DisableApiKeyRequest, ListApiKeysParams,
};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /rest/api-keys[?enabled_only=true]`, newest first.
pub async fn list_api_keys_handler(
    State(state): State<AppState>,
    Query(params): Query<ListApiKeysParams>,
) -> Result<Json<ApiKeysListResponse>, AppError> {
    let now = Utc::now();
    let keys = state.api_key_service.list(params.enabled_only).await?;

    Ok(Json(ApiKeysListResponse {
        data: keys
            .into_iter()
            .map(|k| ApiKeyResponse::new(k, now))
            .collect(),
    }))
}

/// Generates a new API key.
///
/// # Endpoint
///
/// `POST /rest/api-keys` with an optional `{"expiration_date": "..."}` body
///
/// The raw key is only present in this response.
pub async fn create_api_key_handler(
    State(state): State<AppState>,
    payload: Option<Json<CreateApiKeyRequest>>,
) -> Result<(StatusCode, Json<ApiKeyCreatedResponse>), AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let (raw, key) = state.api_key_service.create(payload.expiration_date).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyCreatedResponse {
            key: raw,
            prefix: key.key_prefix,
            expiration_date: key.expiration_date,
            date_created: key.date_created,
        }),
    ))
}

/// Disables a key permanently.
///
/// # Endpoint
///
/// `POST /rest/api-keys/disable` with `{"key": "..."}`
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown.
/// Returns 409 Conflict if the key is already disabled.
pub async fn disable_api_key_handler(
    State(state): State<AppState>,
    Json(payload): Json<DisableApiKeyRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state.api_key_service.disable(&payload.key).await?;
    Ok(StatusCode::NO_CONTENT)
}
