//! PostgreSQL implementation of the visit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewVisit, Visit, VisitLocation};
use crate::domain::repositories::{VisitRepository, VisitsFilter};
use crate::error::AppError;

const SELECT_VISIT: &str = r#"
    SELECT
        v.id, v.short_url_id, v.date, v.remote_addr, v.user_agent, v.referer,
        v.location_skipped,
        l.id AS location_id,
        l.country_code, l.country_name, l.region_name, l.city_name,
        l.latitude, l.longitude, l.timezone
    FROM visits v
    LEFT JOIN visit_locations l ON l.visit_id = v.id
"#;

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: i64,
    short_url_id: i64,
    date: DateTime<Utc>,
    remote_addr: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    location_skipped: bool,
    location_id: Option<i64>,
    country_code: Option<String>,
    country_name: Option<String>,
    region_name: Option<String>,
    city_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        let location = row.location_id.map(|_| VisitLocation {
            country_code: row.country_code,
            country_name: row.country_name,
            region_name: row.region_name,
            city_name: row.city_name,
            latitude: row.latitude,
            longitude: row.longitude,
            timezone: row.timezone,
        });

        Visit {
            id: row.id,
            short_url_id: row.short_url_id,
            date: row.date,
            remote_addr: row.remote_addr,
            user_agent: row.user_agent,
            referer: row.referer,
            location,
            location_skipped: row.location_skipped,
        }
    }
}

/// PostgreSQL repository for visits and visit locations.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO visits (short_url_id, date, remote_addr, user_agent, referer)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new_visit.short_url_id)
        .bind(new_visit.date)
        .bind(&new_visit.remote_addr)
        .bind(&new_visit.user_agent)
        .bind(&new_visit.referer)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(Visit {
            id,
            short_url_id: new_visit.short_url_id,
            date: new_visit.date,
            remote_addr: new_visit.remote_addr,
            user_agent: new_visit.user_agent,
            referer: new_visit.referer,
            location: None,
            location_skipped: false,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Visit>, AppError> {
        let sql = format!("{SELECT_VISIT} WHERE v.id = $1");

        let row = sqlx::query_as::<_, VisitRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Visit::from))
    }

    async fn find_pending_location(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError> {
        let sql = format!(
            "{SELECT_VISIT} WHERE l.id IS NULL AND NOT v.location_skipped AND v.id > $1 \
             ORDER BY v.id ASC LIMIT $2"
        );

        let rows = sqlx::query_as::<_, VisitRow>(&sql)
            .bind(after_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    async fn save_location(
        &self,
        visit_id: i64,
        location: VisitLocation,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO visit_locations
                (visit_id, country_code, country_name, region_name, city_name,
                 latitude, longitude, timezone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (visit_id) DO NOTHING
            "#,
        )
        .bind(visit_id)
        .bind(location.country_code)
        .bind(location.country_name)
        .bind(location.region_name)
        .bind(location.city_name)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.timezone)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_location_skipped(&self, visit_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE visits SET location_skipped = TRUE WHERE id = $1")
            .bind(visit_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn list_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<Vec<Visit>, AppError> {
        let sql = format!(
            r#"{SELECT_VISIT}
            WHERE v.short_url_id = $1
              AND ($2::timestamptz IS NULL OR v.date >= $2)
              AND ($3::timestamptz IS NULL OR v.date <= $3)
            ORDER BY v.date DESC, v.id DESC
            LIMIT $4 OFFSET $5"#
        );

        let rows = sqlx::query_as::<_, VisitRow>(&sql)
            .bind(short_url_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    async fn count_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits v
            WHERE v.short_url_id = $1
              AND ($2::timestamptz IS NULL OR v.date >= $2)
              AND ($3::timestamptz IS NULL OR v.date <= $3)
            "#,
        )
        .bind(short_url_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
