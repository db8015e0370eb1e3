//! Short URL entity and its lifecycle rules.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::AppError;

/// A shortened URL mapping.
///
/// `tags` and `visits_count` are loaded by explicit queries alongside the row;
/// the entity holds no references to other entities.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub date_created: DateTime<Utc>,
    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_visits: Option<i32>,
    pub tags: Vec<String>,
    pub visits_count: i64,
}

/// Outcome of checking a short URL against its validity window and visit cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolvability {
    Resolvable,
    NotYetValid,
    Expired,
    MaxVisitsReached,
}

impl Resolvability {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolvability::Resolvable => "resolved",
            Resolvability::NotYetValid => "not_yet_valid",
            Resolvability::Expired => "expired",
            Resolvability::MaxVisitsReached => "max_visits_reached",
        }
    }
}

impl ShortUrl {
    /// Applies the resolvability rule at time `now`.
    ///
    /// Both window endpoints are inclusive.
    pub fn resolvability(&self, now: DateTime<Utc>) -> Resolvability {
        if self.valid_since.is_some_and(|since| now < since) {
            return Resolvability::NotYetValid;
        }

        if self.valid_until.is_some_and(|until| now > until) {
            return Resolvability::Expired;
        }

        if self.max_visits_reached() {
            return Resolvability::MaxVisitsReached;
        }

        Resolvability::Resolvable
    }

    pub fn is_resolvable(&self, now: DateTime<Utc>) -> bool {
        self.resolvability(now) == Resolvability::Resolvable
    }

    pub fn max_visits_reached(&self) -> bool {
        self.max_visits
            .is_some_and(|max| self.visits_count >= i64::from(max))
    }

    /// Returns the entity's metadata as a patch-free snapshot.
    pub fn meta(&self) -> ShortUrlMeta {
        ShortUrlMeta {
            valid_since: self.valid_since,
            valid_until: self.valid_until,
            max_visits: self.max_visits,
        }
    }
}

/// Validity window and visit cap of a short URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortUrlMeta {
    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_visits: Option<i32>,
}

impl ShortUrlMeta {
    /// Checks the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `valid_since` is after `valid_until`
    /// or `max_visits` is below 1.
    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(since), Some(until)) = (self.valid_since, self.valid_until)
            && since > until
        {
            return Err(AppError::bad_request(
                "valid_since must not be later than valid_until",
                json!({ "valid_since": since, "valid_until": until }),
            ));
        }

        if let Some(max) = self.max_visits
            && max < 1
        {
            return Err(AppError::bad_request(
                "max_visits must be a positive number",
                json!({ "max_visits": max }),
            ));
        }

        Ok(())
    }
}

/// Input for persisting a new short URL.
///
/// `id` is reserved from the store beforehand (see `ShortUrlRepository::next_id`),
/// which is what lets the short code be derived from it.
#[derive(Debug, Clone)]
pub struct NewShortUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub meta: ShortUrlMeta,
    pub tags: Vec<String>,
}

/// Partial metadata update.
///
/// `None` leaves a field unchanged, `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortUrlMetaPatch {
    pub valid_since: Option<Option<DateTime<Utc>>>,
    pub valid_until: Option<Option<DateTime<Utc>>>,
    pub max_visits: Option<Option<i32>>,
}

impl ShortUrlMetaPatch {
    pub fn is_empty(&self) -> bool {
        self.valid_since.is_none() && self.valid_until.is_none() && self.max_visits.is_none()
    }

    /// Merges the patch over existing metadata.
    pub fn apply_to(&self, current: ShortUrlMeta) -> ShortUrlMeta {
        ShortUrlMeta {
            valid_since: self.valid_since.unwrap_or(current.valid_since),
            valid_until: self.valid_until.unwrap_or(current.valid_until),
            max_visits: self.max_visits.unwrap_or(current.max_visits),
        }
    }
}
