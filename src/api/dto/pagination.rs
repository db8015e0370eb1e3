//! Pagination and date range query parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

const DEFAULT_ITEMS_PER_PAGE: u32 = 10;
const MAX_ITEMS_PER_PAGE: u32 = 1000;

/// Page selection shared by every listing endpoint.
///
/// Query strings carry numbers as text, hence `DisplayFromStr`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub items_per_page: Option<u32>,
}

impl PaginationParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE)
    }

    /// Validates the parameters and converts them to `(offset, limit)`.
    ///
    /// Defaults: page 1, 10 items per page. Page size is capped at 1000.
    pub fn validate_and_get_offset_limit(&self) -> Result<(i64, i64), String> {
        let page = self.page();
        let items_per_page = self.items_per_page();

        if page == 0 {
            return Err("page must be greater than 0".to_string());
        }

        if !(1..=MAX_ITEMS_PER_PAGE).contains(&items_per_page) {
            return Err(format!(
                "items_per_page must be between 1 and {MAX_ITEMS_PER_PAGE}"
            ));
        }

        let offset = i64::from(page - 1) * i64::from(items_per_page);
        Ok((offset, i64::from(items_per_page)))
    }
}

/// Pagination block of listing responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub pages_count: u32,
    pub items_per_page: u32,
    pub items_in_current_page: usize,
    pub total_items: i64,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, items_in_current_page: usize, total_items: i64) -> Self {
        let items_per_page = params.items_per_page().max(1);
        let pages_count = (total_items.max(0) as u64).div_ceil(u64::from(items_per_page)) as u32;

        Self {
            current_page: params.page(),
            pages_count,
            items_per_page,
            items_in_current_page,
            total_items,
        }
    }
}

/// Inclusive date range filter.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    #[serde(default, with = "optional_rfc3339")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, with = "optional_rfc3339")]
    pub end_date: Option<DateTime<Utc>>,
}

/// RFC 3339 timestamps in query strings.
mod optional_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, items_per_page: Option<u32>) -> PaginationParams {
        PaginationParams {
            page,
            items_per_page,
        }
    }

    #[test]
    fn test_defaults() {
        let (offset, limit) = params(None, None).validate_and_get_offset_limit().unwrap();
        assert_eq!(offset, 0);
        assert_eq!(limit, 10);
    }

    #[test]
    fn test_custom_page_and_size() {
        let (offset, limit) = params(Some(3), Some(50))
            .validate_and_get_offset_limit()
            .unwrap();
        assert_eq!(offset, 100);
        assert_eq!(limit, 50);
    }

    #[test]
    fn test_bounds() {
        assert!(params(Some(0), None).validate_and_get_offset_limit().is_err());
        assert!(params(None, Some(0)).validate_and_get_offset_limit().is_err());
        assert!(params(None, Some(1000)).validate_and_get_offset_limit().is_ok());
        assert!(params(None, Some(1001)).validate_and_get_offset_limit().is_err());
    }

    #[test]
    fn test_pages_count_rounds_up() {
        let meta = PaginationMeta::new(&params(Some(2), Some(10)), 1, 11);
        assert_eq!(meta.pages_count, 2);
        assert_eq!(meta.current_page, 2);

        let empty = PaginationMeta::new(&params(None, None), 0, 0);
        assert_eq!(empty.pages_count, 0);
    }

    #[test]
    fn test_date_range_parsing() {
        let json = r#"{"start_date": "2026-01-01T00:00:00Z", "end_date": null}"#;
        let p: DateRangeParams = serde_json::from_str(json).unwrap();
        assert!(p.start_date.is_some());
        assert!(p.end_date.is_none());

        assert!(serde_json::from_str::<DateRangeParams>(r#"{"start_date": "yesterday"}"#).is_err());
    }
}
