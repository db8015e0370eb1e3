//! SQL rendering of [`ShortUrlsListQuery`].
//!
//! Listing runs in two phases. The statement built here selects the ids of the
//! requested page with every filter, ordering and pagination applied; the
//! repository then loads the full rows for those ids and keeps the id order.
//! Ordering by visits joins `visits` and groups by short URL only in phase one,
//! so phase two always returns plain short URLs.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::list_query::{OrderField, ShortUrlsListQuery};

/// Escapes `LIKE` metacharacters and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn order_column(field: OrderField) -> &'static str {
    match field {
        OrderField::OriginalUrl => "s.original_url",
        OrderField::ShortCode => "s.short_code",
        OrderField::DateCreated => "s.date_created",
        OrderField::Visits => "COUNT(DISTINCT v.id)",
    }
}

/// Appends the `WHERE` clause shared by listing and counting.
fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ShortUrlsListQuery) {
    qb.push(" WHERE TRUE");

    if let Some(term) = query.effective_search_term() {
        let pattern = like_pattern(term);

        qb.push(" AND (s.original_url ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR s.short_code ILIKE ");
        qb.push_bind(pattern.clone());

        if query.search_includes_tags() {
            qb.push(
                " OR EXISTS (SELECT 1 FROM short_urls_in_tags st \
                 JOIN tags t ON t.id = st.tag_id \
                 WHERE st.short_url_id = s.id AND t.name ILIKE ",
            );
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(")");
    }

    if !query.tags.is_empty() {
        qb.push(
            " AND s.id IN (SELECT st.short_url_id FROM short_urls_in_tags st \
             JOIN tags t ON t.id = st.tag_id \
             WHERE t.name = ANY(",
        );
        qb.push_bind(query.tags.clone());
        qb.push(") GROUP BY st.short_url_id HAVING COUNT(DISTINCT t.name) = ");
        qb.push_bind(query.tags.len() as i64);
        qb.push(")");
    }
}

/// Builds the phase-one statement returning the ids of the requested page.
pub fn build_ids_query(query: &ShortUrlsListQuery) -> QueryBuilder<'static, Postgres> {
    let by_visits = query.order_by.is_by_visits();

    let mut qb = QueryBuilder::new("SELECT s.id FROM short_urls s");
    if by_visits {
        qb.push(" LEFT JOIN visits v ON v.short_url_id = s.id");
    }

    push_filters(&mut qb, query);

    if by_visits {
        qb.push(" GROUP BY s.id");
    }

    if let Some((field, direction)) = query.order_by.effective() {
        qb.push(" ORDER BY ");
        qb.push(order_column(field));
        qb.push(" ");
        qb.push(direction.as_sql());
        qb.push(", s.id ASC");
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    if let Some(offset) = query.offset.filter(|o| *o > 0) {
        qb.push(" OFFSET ");
        qb.push_bind(offset);
    }

    qb
}

/// Builds the statement counting every row the plan's filters match.
pub fn build_count_query(query: &ShortUrlsListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM short_urls s");
    push_filters(&mut qb, query);
    qb
}
