//! DTOs for API key endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ApiKey;

/// Body of `POST /rest/api-keys`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Returned once, on creation: the only time the raw key is visible.
#[derive(Debug, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub key: String,
    pub prefix: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: i64,
    pub prefix: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub expired: bool,
    pub date_created: DateTime<Utc>,
}

impl ApiKeyResponse {
    pub fn new(key: ApiKey, now: DateTime<Utc>) -> Self {
        Self {
            id: key.id,
            expired: key.is_expired(now),
            prefix: key.key_prefix,
            expiration_date: key.expiration_date,
            enabled: key.enabled,
            date_created: key.date_created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiKeysListResponse {
    pub data: Vec<ApiKeyResponse>,
}

/// Query of `GET /rest/api-keys`.
#[derive(Debug, Default, Deserialize)]
pub struct ListApiKeysParams {
    #[serde(default)]
    pub enabled_only: bool,
}

/// Body of `POST /rest/api-keys/disable`.
#[derive(Debug, Deserialize, Validate)]
pub struct DisableApiKeyRequest {
    #[validate(length(min = 1, message = "key is required"))]
    pub key: String,
}
