//! PostgreSQL implementation of the API key repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ApiKey, NewApiKey};
use crate::domain::repositories::ApiKeyRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    id: i64,
    key_hash: String,
    key_prefix: String,
    expiration_date: Option<DateTime<Utc>>,
    enabled: bool,
    date_created: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        ApiKey {
            id: row.id,
            key_hash: row.key_hash,
            key_prefix: row.key_prefix,
            expiration_date: row.expiration_date,
            enabled: row.enabled,
            date_created: row.date_created,
        }
    }
}

/// PostgreSQL repository for API keys.
///
/// Stores HMAC hashes only. Raw keys are never persisted.
pub struct PgApiKeyRepository {
    pool: Arc<PgPool>,
}

impl PgApiKeyRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            INSERT INTO api_keys (key_hash, key_prefix, expiration_date)
            VALUES ($1, $2, $3)
            RETURNING id, key_hash, key_prefix, expiration_date, enabled, date_created
            "#,
        )
        .bind(&new_key.key_hash)
        .bind(&new_key.key_prefix)
        .bind(new_key.expiration_date)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, key_hash, key_prefix, expiration_date, enabled, date_created
            FROM api_keys
            WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ApiKey::from))
    }

    async fn list(&self, enabled_only: bool) -> Result<Vec<ApiKey>, AppError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, key_hash, key_prefix, expiration_date, enabled, date_created
            FROM api_keys
            WHERE NOT $1 OR enabled
            ORDER BY date_created DESC, id DESC
            "#,
        )
        .bind(enabled_only)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ApiKey::from).collect())
    }

    async fn disable(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE api_keys SET enabled = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "API key not found",
                json!({ "id": id }),
            ));
        }

        Ok(())
    }
}
