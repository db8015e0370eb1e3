//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

use super::list_query_sql::{build_count_query, build_ids_query};
use crate::domain::entities::{NewShortUrl, ShortUrl, ShortUrlMeta};
use crate::domain::list_query::ShortUrlsListQuery;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// Columns of a fully loaded short URL: the row plus its tag names and visit count.
const SELECT_SHORT_URL: &str = r#"
    SELECT
        s.id,
        s.short_code,
        s.original_url,
        s.date_created,
        s.valid_since,
        s.valid_until,
        s.max_visits,
        COALESCE(
            (SELECT array_agg(t.name ORDER BY t.name)
             FROM short_urls_in_tags st
             JOIN tags t ON t.id = st.tag_id
             WHERE st.short_url_id = s.id),
            '{}'
        ) AS tags,
        (SELECT COUNT(*) FROM visits v WHERE v.short_url_id = s.id) AS visits_count
    FROM short_urls s
"#;

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    id: i64,
    short_code: String,
    original_url: String,
    date_created: DateTime<Utc>,
    valid_since: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    max_visits: Option<i32>,
    tags: Vec<String>,
    visits_count: i64,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(row: ShortUrlRow) -> Self {
        ShortUrl {
            id: row.id,
            short_code: row.short_code,
            original_url: row.original_url,
            date_created: row.date_created,
            valid_since: row.valid_since,
            valid_until: row.valid_until,
            max_visits: row.max_visits,
            tags: row.tags,
            visits_count: row.visits_count,
        }
    }
}

/// PostgreSQL repository for short URLs.
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: i64) -> Result<ShortUrl, AppError> {
        let sql = format!("{SELECT_SHORT_URL} WHERE s.id = $1");

        sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(ShortUrl::from)
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "id": id })))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<ShortUrl>, AppError> {
        let sql = format!("{SELECT_SHORT_URL} WHERE s.id = ANY($1)");

        let rows = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(ShortUrl::from).collect())
    }
}

/// Creates missing tags and links them to a short URL.
async fn assign_tags(
    tx: &mut Transaction<'_, Postgres>,
    short_url_id: i64,
    tags: &[String],
) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO tags (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING")
        .bind(tags)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO short_urls_in_tags (short_url_id, tag_id)
        SELECT $1, t.id FROM tags t WHERE t.name = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(short_url_id)
    .bind(tags)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn next_id(&self) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT nextval(pg_get_serial_sequence('short_urls', 'id'))",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(id)
    }

    async fn create(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO short_urls (id, short_code, original_url, valid_since, valid_until, max_visits)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(new_short_url.id)
        .bind(&new_short_url.short_code)
        .bind(&new_short_url.original_url)
        .bind(new_short_url.meta.valid_since)
        .bind(new_short_url.meta.valid_until)
        .bind(new_short_url.meta.max_visits)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict { .. } => AppError::conflict(
                "Short code already in use",
                json!({ "short_code": new_short_url.short_code }),
            ),
            other => other,
        })?;

        assign_tags(&mut tx, new_short_url.id, &new_short_url.tags).await?;

        tx.commit().await?;

        self.find_by_id(new_short_url.id).await
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let sql = format!("{SELECT_SHORT_URL} WHERE s.short_code = $1");

        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn short_code_exists(&self, short_code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM short_urls WHERE short_code = $1)",
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn find_list(&self, query: ShortUrlsListQuery) -> Result<Vec<ShortUrl>, AppError> {
        let mut qb = build_ids_query(&query);
        let ids: Vec<i64> = qb
            .build_query_scalar()
            .fetch_all(self.pool.as_ref())
            .await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<i64, ShortUrl> = self
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn count_list(&self, query: ShortUrlsListQuery) -> Result<i64, AppError> {
        let mut qb = build_count_query(&query);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn update_meta(&self, id: i64, meta: ShortUrlMeta) -> Result<ShortUrl, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET valid_since = $2, valid_until = $3, max_visits = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(meta.valid_since)
        .bind(meta.valid_until)
        .bind(meta.max_visits)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Short URL not found",
                json!({ "id": id }),
            ));
        }

        self.find_by_id(id).await
    }

    async fn set_tags(&self, id: i64, tags: Vec<String>) -> Result<ShortUrl, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM short_urls WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if !exists {
            return Err(AppError::not_found(
                "Short URL not found",
                json!({ "id": id }),
            ));
        }

        sqlx::query("DELETE FROM short_urls_in_tags WHERE short_url_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        assign_tags(&mut tx, id, &tags).await?;

        tx.commit().await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, short_code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM short_urls WHERE short_code = $1")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
