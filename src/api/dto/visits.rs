//! DTOs for visit listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pagination::{DateRangeParams, PaginationMeta, PaginationParams};
use crate::domain::entities::{Visit, VisitLocation};

/// Query of `GET /rest/short-urls/{short_code}/visits`.
#[derive(Debug, Default, Deserialize)]
pub struct VisitsParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    #[serde(flatten)]
    pub date_range: DateRangeParams,
}

#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub date: DateTime<Utc>,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visit_location: Option<VisitLocation>,
}

impl From<Visit> for VisitResponse {
    fn from(visit: Visit) -> Self {
        Self {
            date: visit.date,
            remote_addr: visit.remote_addr,
            user_agent: visit.user_agent,
            referer: visit.referer,
            visit_location: visit.location,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VisitsListResponse {
    pub data: Vec<VisitResponse>,
    pub pagination: PaginationMeta,
}
