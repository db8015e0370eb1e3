//! Repository trait for API keys.

use crate::domain::entities::{ApiKey, NewApiKey};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for API key storage.
///
/// Keys are looked up by their HMAC hash; raw tokens never reach this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the hash already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError>;

    /// Lists keys, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, enabled_only: bool) -> Result<Vec<ApiKey>, AppError>;

    /// Sets `enabled = false`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no key has this id.
    /// Returns [`AppError::Internal`] on database errors.
    async fn disable(&self, id: i64) -> Result<(), AppError>;
}
