//! Repository trait for short URL data access.

use crate::domain::entities::{NewShortUrl, ShortUrl, ShortUrlMeta};
use crate::domain::list_query::ShortUrlsListQuery;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for short URLs.
///
/// Every returned [`ShortUrl`] has its `tags` and `visits_count` loaded.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - In-memory arena
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Reserves the next identifier from the store's sequence.
    ///
    /// Reserved identifiers are never handed out twice, even if no row is
    /// ever inserted with them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn next_id(&self) -> Result<i64, AppError>;

    /// Persists a short URL under a previously reserved id, creating missing tags.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, AppError>;

    /// Exact, case-sensitive lookup by short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Returns true if a short URL already uses `short_code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn short_code_exists(&self, short_code: &str) -> Result<bool, AppError>;

    /// Executes a listing plan: filters, ordering and pagination.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_list(&self, query: ShortUrlsListQuery) -> Result<Vec<ShortUrl>, AppError>;

    /// Counts the rows matching the plan's filters. Ordering and pagination are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_list(&self, query: ShortUrlsListQuery) -> Result<i64, AppError>;

    /// Overwrites the validity window and visit cap.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no short URL has this id.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_meta(&self, id: i64, meta: ShortUrlMeta) -> Result<ShortUrl, AppError>;

    /// Replaces the tag set, creating tags on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no short URL has this id.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_tags(&self, id: i64, tags: Vec<String>) -> Result<ShortUrl, AppError>;

    /// Removes a short URL and its visits.
    ///
    /// Returns `Ok(false)` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, short_code: &str) -> Result<bool, AppError>;

    /// Checks that the backing store answers.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
