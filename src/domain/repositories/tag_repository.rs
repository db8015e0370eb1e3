//! Repository trait for tag management.

use crate::domain::entities::TagInfo;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for tags.
///
/// Tag names are unique and case-sensitive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags with their usage count, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self) -> Result<Vec<TagInfo>, AppError>;

    /// Creates the tags that do not exist yet. Returns the number created.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, names: Vec<String>) -> Result<u64, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn exists(&self, name: &str) -> Result<bool, AppError>;

    /// Renames a tag. Returns `Ok(false)` if `old_name` is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `new_name` is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool, AppError>;

    /// Deletes the named tags and their assignments. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, names: Vec<String>) -> Result<u64, AppError>;

    /// Deletes tags no short URL references. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_orphans(&self) -> Result<u64, AppError>;
}
