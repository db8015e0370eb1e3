//! DTOs for short URL endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::pagination::{PaginationMeta, PaginationParams};
use crate::application::services::CreateShortUrl;
use crate::domain::entities::{ShortUrl, ShortUrlMeta, ShortUrlMetaPatch};
use crate::domain::list_query::{OrderBy, ShortUrlsListQuery};

/// Body of `POST /rest/short-urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShortUrlRequest {
    /// Missing and blank values are reported as "A URL was not provided".
    #[serde(default)]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub long_url: String,

    /// Shape rules live in `validate_custom_slug`.
    pub custom_slug: Option<String>,

    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "max_visits must be a positive number"))]
    pub max_visits: Option<i32>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreateShortUrlRequest> for CreateShortUrl {
    fn from(req: CreateShortUrlRequest) -> Self {
        CreateShortUrl {
            long_url: req.long_url,
            custom_slug: req.custom_slug,
            meta: ShortUrlMeta {
                valid_since: req.valid_since,
                valid_until: req.valid_until,
                max_visits: req.max_visits,
            },
            tags: req.tags,
        }
    }
}

/// Body of `PUT /rest/short-urls/{short_code}`.
///
/// Absent fields are left unchanged, `null` clears a field, a value sets it.
#[derive(Debug, Default, Deserialize)]
pub struct EditShortUrlRequest {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub valid_since: Option<Option<DateTime<Utc>>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub valid_until: Option<Option<DateTime<Utc>>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub max_visits: Option<Option<i32>>,
}

impl From<EditShortUrlRequest> for ShortUrlMetaPatch {
    fn from(req: EditShortUrlRequest) -> Self {
        ShortUrlMetaPatch {
            valid_since: req.valid_since,
            valid_until: req.valid_until,
            max_visits: req.max_visits,
        }
    }
}

/// Body of `PUT /rest/short-urls/{short_code}/tags`.
#[derive(Debug, Deserialize)]
pub struct SetTagsRequest {
    pub tags: Vec<String>,
}

/// Query of `GET /rest/short-urls`.
#[derive(Debug, Default, Deserialize)]
pub struct ListShortUrlsParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub search_term: Option<String>,

    /// Comma-separated tag names; a short URL must carry all of them.
    pub tags: Option<String>,

    /// `field` or `field-ASC` / `field-DESC`.
    pub order_by: Option<String>,
}

impl ListShortUrlsParams {
    pub fn tag_list(&self) -> Vec<String> {
        split_comma_list(self.tags.as_deref())
    }

    /// Builds the listing plan for one page.
    pub fn to_query(&self, offset: i64, limit: i64) -> ShortUrlsListQuery {
        let order_by = match self.order_by.as_deref().map(str::trim) {
            None | Some("") => OrderBy::Default,
            Some(raw) => raw.parse().unwrap_or_default(),
        };

        let mut query = ShortUrlsListQuery::new()
            .with_tags(self.tag_list())
            .order_by(order_by)
            .paginate(limit, offset);

        if let Some(term) = &self.search_term {
            query = query.search(term.clone());
        }

        query
    }
}

/// Splits `a,b , c` into trimmed non-empty names.
pub fn split_comma_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Query of `GET /rest/short-urls/shorten`.
#[derive(Debug, Default, Deserialize)]
pub struct SingleStepParams {
    pub api_key: Option<String>,
    pub long_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortUrlMetaResponse {
    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_visits: Option<i32>,
}

/// JSON representation of a short URL.
#[derive(Debug, Serialize)]
pub struct ShortUrlResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub date_created: DateTime<Utc>,
    pub visits_count: i64,
    pub tags: Vec<String>,
    pub meta: ShortUrlMetaResponse,
}

impl ShortUrlResponse {
    /// `short_url` is the public URL built by `ShortUrlService::short_url`.
    pub fn new(entity: ShortUrl, short_url: String) -> Self {
        Self {
            short_code: entity.short_code,
            short_url,
            long_url: entity.original_url,
            date_created: entity.date_created,
            visits_count: entity.visits_count,
            tags: entity.tags,
            meta: ShortUrlMetaResponse {
                valid_since: entity.valid_since,
                valid_until: entity.valid_until,
                max_visits: entity.max_visits,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShortUrlsListResponse {
    pub data: Vec<ShortUrlResponse>,
    pub pagination: PaginationMeta,
}
