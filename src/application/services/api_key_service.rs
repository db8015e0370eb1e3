//! API key issuing and authentication.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::{ApiKey, NewApiKey};
use crate::domain::repositories::ApiKeyRepository;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated raw key.
pub const API_KEY_LENGTH: usize = 48;

/// Number of leading characters kept in clear for listings.
const KEY_PREFIX_LENGTH: usize = 8;

/// Service for API key management.
///
/// Keys are hashed with HMAC-SHA256 keyed by `signing_secret` before storage
/// and comparison. Read access to the database is not enough to verify or
/// forge keys without the server-side secret.
pub struct ApiKeyService {
    repository: Arc<dyn ApiKeyRepository>,
    signing_secret: String,
}

impl ApiKeyService {
    /// `signing_secret` must match the value used when existing keys were created.
    pub fn new(repository: Arc<dyn ApiKeyRepository>, signing_secret: impl Into<String>) -> Self {
        Self {
            repository,
            signing_secret: signing_secret.into(),
        }
    }

    /// Returns the 64-character hex HMAC of a raw key.
    fn hash_key(&self, key: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes()).map_err(|e| {
            AppError::internal("Failed to initialise HMAC", json!({ "reason": e.to_string() }))
        })?;
        mac.update(key.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Generates and stores a new key.
    ///
    /// Returns the raw key together with the stored record. The raw key is not
    /// recoverable afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn create(
        &self,
        expiration_date: Option<DateTime<Utc>>,
    ) -> Result<(String, ApiKey), AppError> {
        let raw: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(API_KEY_LENGTH)
            .map(char::from)
            .collect();

        let api_key = self
            .repository
            .create(NewApiKey {
                key_hash: self.hash_key(&raw)?,
                key_prefix: raw.chars().take(KEY_PREFIX_LENGTH).collect(),
                expiration_date,
            })
            .await?;

        tracing::info!(
            id = api_key.id,
            prefix = %api_key.key_prefix,
            expiration_date = ?api_key.expiration_date,
            "API key created"
        );

        Ok((raw, api_key))
    }

    /// Returns true if the key exists, is enabled and has not expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let hash = self.hash_key(key)?;
        let found = self.repository.find_by_hash(&hash).await?;
        Ok(found.is_some_and(|k| k.is_valid(now)))
    }

    /// Authenticates an API request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the key is unknown, disabled or expired.
    pub async fn authenticate(&self, key: &str) -> Result<(), AppError> {
        if !self.check(key, Utc::now()).await? {
            return Err(AppError::unauthorized(
                "Invalid API key",
                json!({ "reason": "Unknown, disabled or expired API key" }),
            ));
        }
        Ok(())
    }

    /// Permanently disables a key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the key is unknown.
    /// Returns [`AppError::Conflict`] if the key is already disabled.
    pub async fn disable(&self, key: &str) -> Result<(), AppError> {
        let hash = self.hash_key(key)?;
        let api_key = self
            .repository
            .find_by_hash(&hash)
            .await?
            .ok_or_else(|| AppError::not_found("API key not found", json!({})))?;

        if !api_key.enabled {
            return Err(AppError::conflict(
                "API key is already disabled",
                json!({ "prefix": api_key.key_prefix }),
            ));
        }

        self.repository.disable(api_key.id).await?;
        tracing::info!(id = api_key.id, prefix = %api_key.key_prefix, "API key disabled");

        Ok(())
    }

    /// Lists keys, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self, enabled_only: bool) -> Result<Vec<ApiKey>, AppError> {
        self.repository.list(enabled_only).await
    }
}
