//! Visit entity and its resolved location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One redirect event on a short URL.
///
/// `location` is filled later by the location worker. A visit whose address can
/// never be located carries `location_skipped = true` and no location.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub id: i64,
    pub short_url_id: i64,
    pub date: DateTime<Utc>,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub location: Option<VisitLocation>,
    pub location_skipped: bool,
}

impl Visit {
    /// True while the visit still waits for location resolution.
    pub fn is_pending_location(&self) -> bool {
        self.location.is_none() && !self.location_skipped
    }
}

/// Input for recording a visit.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub short_url_id: i64,
    pub date: DateTime<Utc>,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Geographic data resolved for a visit address.
///
/// Also the value stored in the location cache, hence the serde derives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitLocation {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
    pub city_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}
