//! Repository trait for visits and their locations.

use crate::domain::entities::{NewVisit, Visit, VisitLocation};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter criteria for visit listings.
///
/// Date bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitsFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
}

impl VisitsFilter {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            start_date: None,
            end_date: None,
            offset,
            limit,
        }
    }

    pub fn with_date_range(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Date-range part of the filter.
    pub fn includes(&self, date: DateTime<Utc>) -> bool {
        self.start_date.is_none_or(|s| date >= s) && self.end_date.is_none_or(|e| date <= e)
    }
}

/// Repository interface for visit tracking.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVisitRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - In-memory arena
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Appends a visit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Visit>, AppError>;

    /// Visits with neither a location nor the skipped mark and an id above
    /// `after_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_pending_location(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError>;

    /// Stores a location for a visit.
    ///
    /// Returns `Ok(false)` when the visit already had one; the existing row is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn save_location(&self, visit_id: i64, location: VisitLocation)
    -> Result<bool, AppError>;

    /// Flags a visit whose location can never be resolved.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn mark_location_skipped(&self, visit_id: i64) -> Result<(), AppError>;

    /// Visits of one short URL, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<Vec<Visit>, AppError>;

    /// Counts visits of one short URL within the filter's date range.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<i64, AppError>;
}
