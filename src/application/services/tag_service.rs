//! Tag management.

use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{TagInfo, normalize_tag_names};
use crate::domain::repositories::TagRepository;
use crate::error::AppError;

pub struct TagService {
    repository: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repository: Arc<dyn TagRepository>) -> Self {
        Self { repository }
    }

    /// Tags with usage counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self) -> Result<Vec<TagInfo>, AppError> {
        self.repository.list().await
    }

    /// Creates the given tags; existing names are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if no usable name is given.
    pub async fn create(&self, names: Vec<String>) -> Result<u64, AppError> {
        let names = normalize_tag_names(names);
        if names.is_empty() {
            return Err(AppError::bad_request(
                "At least one tag name is required",
                json!({ "field": "tags" }),
            ));
        }

        let created = self.repository.create(names).await?;
        tracing::info!(created, "Tags created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if either name is blank.
    /// Returns [`AppError::NotFound`] if `old_name` does not exist.
    /// Returns [`AppError::Conflict`] if `new_name` already exists.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), AppError> {
        let (old_name, new_name) = (old_name.trim(), new_name.trim());
        if old_name.is_empty() || new_name.is_empty() {
            return Err(AppError::bad_request(
                "Both old_name and new_name are required",
                json!({ "old_name": old_name, "new_name": new_name }),
            ));
        }

        if !self.repository.exists(old_name).await? {
            return Err(AppError::not_found(
                "Tag not found",
                json!({ "tag": old_name }),
            ));
        }

        if old_name == new_name {
            return Ok(());
        }

        if self.repository.exists(new_name).await? {
            return Err(AppError::conflict(
                "A tag with this name already exists",
                json!({ "tag": new_name }),
            ));
        }

        if !self.repository.rename(old_name, new_name).await? {
            return Err(AppError::not_found(
                "Tag not found",
                json!({ "tag": old_name }),
            ));
        }

        tracing::info!(old_name, new_name, "Tag renamed");
        Ok(())
    }

    /// Deletes the named tags. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn delete(&self, names: Vec<String>) -> Result<u64, AppError> {
        let names = normalize_tag_names(names);
        if names.is_empty() {
            return Ok(0);
        }

        let deleted = self.repository.delete(names).await?;
        tracing::info!(deleted, "Tags deleted");
        Ok(deleted)
    }

    /// Deletes tags no short URL uses.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn prune_orphans(&self) -> Result<u64, AppError> {
        let deleted = self.repository.delete_orphans().await?;
        tracing::info!(deleted, "Orphan tags pruned");
        Ok(deleted)
    }
}
