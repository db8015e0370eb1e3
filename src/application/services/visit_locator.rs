//! Out-of-band geolocation of visits.
//!
//! Resolution order for a pending visit:
//!
//! 1. Addresses that can never be located (missing, unparsable, private or
//!    reserved ranges) mark the visit skipped without any lookup.
//! 2. The location cache is consulted.
//! 3. The provider is called, retrying transient failures with exponential
//!    backoff. A permanent failure marks the visit skipped; exhausted retries
//!    leave it pending for a later `visit process` run.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::entities::VisitLocation;
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;
use crate::infrastructure::cache::LocationCache;
use crate::infrastructure::geolocation::{IpLocationResolver, LocationError, is_locatable};

/// Result of processing a single visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    /// A location was stored for the visit.
    Located,
    /// The visit already had a location or was already skipped.
    AlreadyLocated,
    /// The address can never be located; the visit is marked skipped.
    Skipped,
    /// Retries ran out on transient failures; the visit stays pending.
    Pending,
    /// The visit no longer exists.
    Missing,
}

impl LocateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocateOutcome::Located => "located",
            LocateOutcome::AlreadyLocated => "already_located",
            LocateOutcome::Skipped => "skipped",
            LocateOutcome::Pending => "pending",
            LocateOutcome::Missing => "missing",
        }
    }
}

/// Backoff applied to transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Base of the exponential sequence, in milliseconds.
    pub base_millis: u64,
    /// Multiplier applied to every delay.
    pub factor: u64,
    pub max_delay: Duration,
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    /// 500ms, 1s, 2s with jitter.
    fn default() -> Self {
        Self {
            base_millis: 2,
            factor: 250,
            max_delay: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBackoff::from_millis(self.base_millis)
            .factor(self.factor)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_retries)
    }
}

/// Totals of a [`VisitLocator::process_pending`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocateSummary {
    pub located: u64,
    pub skipped: u64,
    pub pending: u64,
}

impl LocateSummary {
    fn record(&mut self, outcome: LocateOutcome) {
        match outcome {
            LocateOutcome::Located => self.located += 1,
            LocateOutcome::Skipped => self.skipped += 1,
            LocateOutcome::Pending => self.pending += 1,
            LocateOutcome::AlreadyLocated | LocateOutcome::Missing => {}
        }
    }
}

/// Resolves and stores visit locations.
pub struct VisitLocator {
    visits: Arc<dyn VisitRepository>,
    resolver: Arc<dyn IpLocationResolver>,
    cache: Arc<dyn LocationCache>,
    retry: RetryPolicy,
}

impl VisitLocator {
    pub fn new(
        visits: Arc<dyn VisitRepository>,
        resolver: Arc<dyn IpLocationResolver>,
        cache: Arc<dyn LocationCache>,
    ) -> Self {
        Self {
            visits,
            resolver,
            cache,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Locates one visit.
    ///
    /// `remote_addr` overrides the stored address when given; the worker passes
    /// the address it received with the event. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors. Provider and cache
    /// failures are not errors.
    pub async fn locate(
        &self,
        visit_id: i64,
        remote_addr: Option<&str>,
    ) -> Result<LocateOutcome, AppError> {
        let outcome = self.locate_inner(visit_id, remote_addr).await?;
        metrics::counter!("visit_locations_total", "outcome" => outcome.as_str()).increment(1);
        Ok(outcome)
    }

    async fn locate_inner(
        &self,
        visit_id: i64,
        remote_addr: Option<&str>,
    ) -> Result<LocateOutcome, AppError> {
        let Some(visit) = self.visits.find_by_id(visit_id).await? else {
            return Ok(LocateOutcome::Missing);
        };

        if !visit.is_pending_location() {
            return Ok(LocateOutcome::AlreadyLocated);
        }

        let addr = remote_addr.or(visit.remote_addr.as_deref());
        let Some(ip) = addr
            .and_then(|a| a.parse::<IpAddr>().ok())
            .filter(is_locatable)
        else {
            tracing::debug!(visit_id, remote_addr = ?addr, "Address cannot be located");
            self.visits.mark_location_skipped(visit_id).await?;
            return Ok(LocateOutcome::Skipped);
        };

        let key = ip.to_string();
        match self.cache.get_location(&key).await {
            Ok(Some(location)) => {
                tracing::debug!(visit_id, ip = %key, "Location cache hit");
                return self.store(visit_id, location).await;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(ip = %key, error = %e, "Location cache read failed"),
        }

        let resolved = RetryIf::start(
            self.retry.delays(),
            || self.resolver.resolve(ip),
            |e: &LocationError| {
                tracing::debug!(visit_id, error = %e, "Location lookup failed");
                e.is_transient()
            },
        )
        .await;

        match resolved {
            Ok(location) => {
                if let Err(e) = self.cache.set_location(&key, &location, None).await {
                    tracing::warn!(ip = %key, error = %e, "Location cache write failed");
                }
                self.store(visit_id, location).await
            }
            Err(LocationError::Permanent(reason)) => {
                tracing::info!(visit_id, ip = %key, reason, "Address cannot be located");
                self.visits.mark_location_skipped(visit_id).await?;
                Ok(LocateOutcome::Skipped)
            }
            Err(LocationError::Transient(reason)) => {
                tracing::warn!(visit_id, ip = %key, reason, "Giving up on location for now");
                Ok(LocateOutcome::Pending)
            }
        }
    }

    async fn store(
        &self,
        visit_id: i64,
        location: VisitLocation,
    ) -> Result<LocateOutcome, AppError> {
        if self.visits.save_location(visit_id, location).await? {
            Ok(LocateOutcome::Located)
        } else {
            Ok(LocateOutcome::AlreadyLocated)
        }
    }

    /// Locates every pending visit, `batch_size` at a time.
    ///
    /// Each batch starts after the highest id seen so far, so visits left pending
    /// by transient failures never hide newer ones. Every visit is tried at most
    /// once per sweep.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn process_pending(&self, batch_size: i64) -> Result<LocateSummary, AppError> {
        let mut summary = LocateSummary::default();
        let mut last_seen = 0;

        loop {
            let batch = self
                .visits
                .find_pending_location(last_seen, batch_size)
                .await?;

            let Some(last) = batch.last() else {
                break;
            };
            last_seen = last.id;

            for visit in batch {
                let outcome = self.locate(visit.id, None).await?;
                summary.record(outcome);
            }
        }

        tracing::info!(
            located = summary.located,
            skipped = summary.skipped,
            pending = summary.pending,
            "Pending visits processed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Visit;
    use crate::domain::repositories::MockVisitRepository;
    use crate::infrastructure::cache::{MockLocationCache, NullCache};
    use crate::infrastructure::geolocation::MockIpLocationResolver;
    use chrono::Utc;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            base_millis: 1,
            factor: 1,
            max_delay: Duration::from_millis(1),
            max_retries: 2,
        }
    }

    fn pending_visit(id: i64, addr: Option<&str>) -> Visit {
        Visit {
            id,
            short_url_id: 1,
            date: Utc::now(),
            remote_addr: addr.map(str::to_string),
            user_agent: None,
            referer: None,
            location: None,
            location_skipped: false,
        }
    }

    fn berlin() -> VisitLocation {
        VisitLocation {
            country_code: Some("DE".to_string()),
            city_name: Some("Berlin".to_string()),
            ..Default::default()
        }
    }

    fn locator(
        visits: MockVisitRepository,
        resolver: MockIpLocationResolver,
    ) -> VisitLocator {
        VisitLocator::new(Arc::new(visits), Arc::new(resolver), Arc::new(NullCache::new()))
            .with_retry_policy(fast_retry())
    }

    #[tokio::test]
    async fn test_locates_public_address() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("8.8.8.8")))));
        visits
            .expect_save_location()
            .withf(|id, loc| *id == 5 && loc.city_name.as_deref() == Some("Berlin"))
            .times(1)
            .returning(|_, _| Ok(true));

        let mut resolver = MockIpLocationResolver::new();
        resolver.expect_resolve().times(1).returning(|_| Ok(berlin()));

        let outcome = locator(visits, resolver).locate(5, None).await.unwrap();
        assert_eq!(outcome, LocateOutcome::Located);
    }

    #[tokio::test]
    async fn test_private_address_is_skipped_without_lookup() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("192.168.1.10")))));
        visits
            .expect_mark_location_skipped()
            .times(1)
            .returning(|_| Ok(()));

        let mut resolver = MockIpLocationResolver::new();
        resolver.expect_resolve().never();

        let outcome = locator(visits, resolver).locate(1, None).await.unwrap();
        assert_eq!(outcome, LocateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_missing_address_is_skipped() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, None))));
        visits
            .expect_mark_location_skipped()
            .times(1)
            .returning(|_| Ok(()));

        let outcome = locator(visits, MockIpLocationResolver::new())
            .locate(1, None)
            .await
            .unwrap();
        assert_eq!(outcome, LocateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_already_located_visit_untouched() {
        let mut visits = MockVisitRepository::new();
        visits.expect_find_by_id().returning(|id| {
            let mut v = pending_visit(id, Some("8.8.8.8"));
            v.location = Some(berlin());
            Ok(Some(v))
        });
        visits.expect_save_location().never();

        let outcome = locator(visits, MockIpLocationResolver::new())
            .locate(1, None)
            .await
            .unwrap();
        assert_eq!(outcome, LocateOutcome::AlreadyLocated);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("1.1.1.1")))));
        visits.expect_save_location().times(1).returning(|_, _| Ok(true));

        let mut resolver = MockIpLocationResolver::new();
        let mut seq = mockall::Sequence::new();
        resolver
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(LocationError::Transient("429".to_string())));
        resolver
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(berlin()));

        let outcome = locator(visits, resolver).locate(1, None).await.unwrap();
        assert_eq!(outcome, LocateOutcome::Located);
    }

    #[tokio::test]
    async fn test_exhausted_retries_leave_visit_pending() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("1.1.1.1")))));
        visits.expect_mark_location_skipped().never();
        visits.expect_save_location().never();

        let mut resolver = MockIpLocationResolver::new();
        resolver
            .expect_resolve()
            .times(3)
            .returning(|_| Err(LocationError::Transient("timeout".to_string())));

        let outcome = locator(visits, resolver).locate(1, None).await.unwrap();
        assert_eq!(outcome, LocateOutcome::Pending);
    }

    #[tokio::test]
    async fn test_permanent_failure_marks_skipped_without_retry() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("1.1.1.1")))));
        visits
            .expect_mark_location_skipped()
            .times(1)
            .returning(|_| Ok(()));

        let mut resolver = MockIpLocationResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(|_| Err(LocationError::Permanent("reserved range".to_string())));

        let outcome = locator(visits, resolver).locate(1, None).await.unwrap();
        assert_eq!(outcome, LocateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("8.8.4.4")))));
        visits.expect_save_location().times(1).returning(|_, _| Ok(true));

        let mut cache = MockLocationCache::new();
        cache
            .expect_get_location()
            .withf(|ip| ip == "8.8.4.4")
            .returning(|_| Ok(Some(berlin())));
        cache.expect_set_location().never();

        let mut resolver = MockIpLocationResolver::new();
        resolver.expect_resolve().never();

        let locator = VisitLocator::new(Arc::new(visits), Arc::new(resolver), Arc::new(cache));
        assert_eq!(locator.locate(1, None).await.unwrap(), LocateOutcome::Located);
    }

    #[tokio::test]
    async fn test_process_pending_stops_when_no_progress() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_pending_location()
            .returning(|after, _| {
                if after < 1 {
                    Ok(vec![pending_visit(1, Some("1.1.1.1"))])
                } else {
                    Ok(vec![])
                }
            });
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("1.1.1.1")))));

        let mut resolver = MockIpLocationResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(LocationError::Transient("down".to_string())));

        let summary = locator(visits, resolver).process_pending(10).await.unwrap();
        assert_eq!(
            summary,
            LocateSummary {
                located: 0,
                skipped: 0,
                pending: 1
            }
        );
    }

    #[tokio::test]
    async fn test_process_pending_pages_past_visits_left_pending() {
        let mut visits = MockVisitRepository::new();
        visits
            .expect_find_pending_location()
            .returning(|after, limit| {
                Ok((1..=4)
                    .filter(|id| *id > after)
                    .take(limit as usize)
                    .map(|id| pending_visit(id, Some("1.1.1.1")))
                    .collect())
            });
        visits
            .expect_find_by_id()
            .returning(|id| Ok(Some(pending_visit(id, Some("1.1.1.1")))));
        visits
            .expect_save_location()
            .withf(|id, _| *id == 4)
            .times(1)
            .returning(|_, _| Ok(true));

        let mut resolver = MockIpLocationResolver::new();
        let mut seq = mockall::Sequence::new();
        resolver
            .expect_resolve()
            .times(3)
            .in_sequence(&mut seq)
            .returning(|_| Err(LocationError::Transient("down".to_string())));
        resolver
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(berlin()));

        let retry = RetryPolicy {
            max_retries: 0,
            ..fast_retry()
        };
        let locator = VisitLocator::new(
            Arc::new(visits),
            Arc::new(resolver),
            Arc::new(NullCache::new()),
        )
        .with_retry_policy(retry);

        let summary = locator.process_pending(3).await.unwrap();
        assert_eq!(
            summary,
            LocateSummary {
                located: 1,
                skipped: 0,
                pending: 3
            }
        );
    }
}
