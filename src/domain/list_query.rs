//! Query plan for short URL listings.
//!
//! A [`ShortUrlsListQuery`] collects every recognized listing option in one value.
//! Repositories turn it into SQL (see `infrastructure::persistence::list_query_sql`)
//! or evaluate it directly with [`ShortUrlsListQuery::matches`] and
//! [`OrderBy::compare`].
//!
//! # Options
//!
//! - `search_term` - case-insensitive substring match on the original URL, the
//!   short code or any tag name. Tag names are left out when a tag filter is set.
//! - `tags` - the short URL must carry every listed tag.
//! - `order_by` - see [`OrderBy`]. Defaults to ascending creation date.
//! - `limit` / `offset` - applied after ordering; ignored when counting.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::domain::entities::{ShortUrl, normalize_tag_names};

/// Fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    OriginalUrl,
    ShortCode,
    DateCreated,
    Visits,
}

impl OrderField {
    /// Maps a field name or one of its aliases.
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "originalUrl" | "longUrl" | "original_url" | "long_url" => Some(Self::OriginalUrl),
            "shortCode" | "short_code" => Some(Self::ShortCode),
            "dateCreated" | "date_created" => Some(Self::DateCreated),
            "visits" | "visitsCount" | "visitCount" | "visits_count" => Some(Self::Visits),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Requested ordering of a listing.
///
/// Written as `field` or `field-ASC` / `field-DESC`. A field outside the
/// recognized set parses into [`OrderBy::Unrecognized`]: the request is accepted
/// and no ordering is applied at all, not even the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrderBy {
    /// Nothing requested: ascending creation date.
    #[default]
    Default,
    Field(OrderField, Direction),
    Unrecognized(String),
}

impl FromStr for OrderBy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(OrderBy::Default);
        }

        let (name, direction) = match s.rsplit_once('-') {
            Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, Direction::Desc),
            Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, Direction::Asc),
            _ => (s, Direction::Asc),
        };

        Ok(match OrderField::from_name(name) {
            Some(field) => OrderBy::Field(field, direction),
            None => OrderBy::Unrecognized(s.to_string()),
        })
    }
}

impl OrderBy {
    /// The field and direction actually applied, if any.
    pub fn effective(&self) -> Option<(OrderField, Direction)> {
        match self {
            OrderBy::Default => Some((OrderField::DateCreated, Direction::Asc)),
            OrderBy::Field(field, direction) => Some((*field, *direction)),
            OrderBy::Unrecognized(_) => None,
        }
    }

    pub fn is_by_visits(&self) -> bool {
        matches!(self, OrderBy::Field(OrderField::Visits, _))
    }

    /// Compares two short URLs under this ordering.
    ///
    /// Ties are broken by id so results are stable. Returns `None` for
    /// [`OrderBy::Unrecognized`].
    pub fn compare(&self, a: &ShortUrl, b: &ShortUrl) -> Option<Ordering> {
        let (field, direction) = self.effective()?;

        let primary = match field {
            OrderField::OriginalUrl => a.original_url.cmp(&b.original_url),
            OrderField::ShortCode => a.short_code.cmp(&b.short_code),
            OrderField::DateCreated => a.date_created.cmp(&b.date_created),
            OrderField::Visits => a.visits_count.cmp(&b.visits_count),
        };

        Some(direction.apply(primary).then_with(|| a.id.cmp(&b.id)))
    }
}

/// Listing options composed into a single plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortUrlsListQuery {
    pub search_term: Option<String>,
    pub tags: Vec<String>,
    pub order_by: OrderBy,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ShortUrlsListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tag_names(tags);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Search term after trimming, `None` when blank.
    pub fn effective_search_term(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Whether the search term also looks at tag names.
    pub fn search_includes_tags(&self) -> bool {
        self.tags.is_empty()
    }

    /// Same filters, no ordering or pagination. Used for totals.
    pub fn for_count(&self) -> Self {
        Self {
            search_term: self.search_term.clone(),
            tags: self.tags.clone(),
            order_by: OrderBy::Unrecognized(String::new()),
            limit: None,
            offset: None,
        }
    }

    /// Evaluates the filter part of the plan against a loaded short URL.
    pub fn matches(&self, url: &ShortUrl) -> bool {
        if !self.tags.iter().all(|t| url.tags.contains(t)) {
            return false;
        }

        let Some(term) = self.effective_search_term() else {
            return true;
        };
        let term = term.to_lowercase();

        url.original_url.to_lowercase().contains(&term)
            || url.short_code.to_lowercase().contains(&term)
            || (self.search_includes_tags()
                && url.tags.iter().any(|t| t.to_lowercase().contains(&term)))
    }
}
