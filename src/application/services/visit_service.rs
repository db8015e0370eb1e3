//! Visit recording and visit listings.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::entities::{NewVisit, ShortUrl, Visit};
use crate::domain::repositories::{ShortUrlRepository, VisitRepository, VisitsFilter};
use crate::error::AppError;
use serde_json::json;

/// Request data captured for a visit.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// One page of visits plus the total for the same date range.
#[derive(Debug, Clone)]
pub struct VisitsPage {
    pub visits: Vec<Visit>,
    pub total: i64,
}

/// Service for recording and querying visits.
pub struct VisitService {
    short_urls: Arc<dyn ShortUrlRepository>,
    visits: Arc<dyn VisitRepository>,
}

impl VisitService {
    pub fn new(short_urls: Arc<dyn ShortUrlRepository>, visits: Arc<dyn VisitRepository>) -> Self {
        Self { short_urls, visits }
    }

    /// Appends a visit to an already resolved short URL.
    ///
    /// Runs on the redirect path; location resolution happens later.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn track_visit(
        &self,
        short_url: &ShortUrl,
        context: VisitContext,
        now: DateTime<Utc>,
    ) -> Result<Visit, AppError> {
        let visit = self
            .visits
            .create(NewVisit {
                short_url_id: short_url.id,
                date: now,
                remote_addr: context.remote_addr,
                user_agent: context.user_agent,
                referer: context.referer,
            })
            .await?;

        metrics::counter!("visits_tracked_total").increment(1);
        tracing::debug!(
            short_code = %short_url.short_code,
            visit_id = visit.id,
            "Visit tracked"
        );

        Ok(visit)
    }

    /// Visits of a short URL, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    /// Returns [`AppError::Validation`] if the date range is inverted.
    pub async fn visits_for(
        &self,
        short_code: &str,
        filter: VisitsFilter,
    ) -> Result<VisitsPage, AppError> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
            && start > end
        {
            return Err(AppError::bad_request(
                "start_date must not be later than end_date",
                json!({ "start_date": start, "end_date": end }),
            ));
        }

        let short_url = self
            .short_urls
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "No URL found with this short code",
                    json!({ "short_code": short_code }),
                )
            })?;

        let visits = self
            .visits
            .list_for_short_url(short_url.id, filter.clone())
            .await?;
        let total = self
            .visits
            .count_for_short_url(short_url.id, filter)
            .await?;

        Ok(VisitsPage { visits, total })
    }
}
