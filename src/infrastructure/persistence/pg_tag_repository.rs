//! PostgreSQL implementation of the tag repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::TagInfo;
use crate::domain::repositories::TagRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct TagInfoRow {
    name: String,
    short_urls_count: i64,
}

/// PostgreSQL repository for tags.
pub struct PgTagRepository {
    pool: Arc<PgPool>,
}

impl PgTagRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<TagInfo>, AppError> {
        let rows = sqlx::query_as::<_, TagInfoRow>(
            r#"
            SELECT t.name, COUNT(st.short_url_id) AS short_urls_count
            FROM tags t
            LEFT JOIN short_urls_in_tags st ON st.tag_id = t.id
            GROUP BY t.id, t.name
            ORDER BY t.name ASC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TagInfo {
                name: r.name,
                short_urls_count: r.short_urls_count,
            })
            .collect())
    }

    async fn create(&self, names: Vec<String>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO tags (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&names)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tags WHERE name = $1)")
                .bind(name)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tags SET name = $2 WHERE name = $1")
            .bind(old_name)
            .bind(new_name)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::conflict(
                    "A tag with this name already exists",
                    json!({ "name": new_name }),
                ),
                other => other,
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, names: Vec<String>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE name = ANY($1)")
            .bind(&names)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_orphans(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tags t
            WHERE NOT EXISTS (SELECT 1 FROM short_urls_in_tags st WHERE st.tag_id = t.id)
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
