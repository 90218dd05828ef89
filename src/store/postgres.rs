use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::DurableStore;
use crate::error::AppResult;

/// Postgres-backed durable store. One row per hash field, expiry tracked per
/// key in a side table and enforced lazily on read, FIFO pop via
/// `DELETE .. RETURNING` on the lowest id with `SKIP LOCKED` so a second
/// consumer can never observe the same entry.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the schema exists. Run once at startup.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hash_records (
                key TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (key, field)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hash_expiry (
                key TEXT PRIMARY KEY,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_entries (
                id BIGSERIAL PRIMARY KEY,
                key TEXT NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log_entries (
                id BIGSERIAL PRIMARY KEY,
                key TEXT NOT NULL,
                score BIGINT NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop an expired record and its expiry row. Returns true when the key
    /// was expired.
    async fn reap_if_expired(&self, key: &str) -> AppResult<bool> {
        let expired = sqlx::query(
            "DELETE FROM hash_expiry WHERE key = $1 AND expires_at <= NOW() RETURNING key",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        if expired {
            sqlx::query("DELETE FROM hash_records WHERE key = $1")
                .bind(key)
                .execute(&self.pool)
                .await?;
        }
        Ok(expired)
    }
}

#[async_trait]
impl DurableStore for PgStore {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hash_records (key, field, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (key, field) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        if self.reap_if_expired(key).await? {
            return Ok(None);
        }

        let row = sqlx::query("SELECT value FROM hash_records WHERE key = $1 AND field = $2")
            .bind(key)
            .bind(field)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        if self.reap_if_expired(key).await? {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT field, value FROM hash_records WHERE key = $1")
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("field"), r.get::<String, _>("value")))
            .collect())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hash_expiry (key, expires_at)
            VALUES ($1, NOW() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn queue_push(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO queue_entries (key, value) VALUES ($1, $2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn queue_pop(&self, key: &str) -> AppResult<Option<String>> {
        let row = sqlx::query(
            r#"
            DELETE FROM queue_entries
            WHERE id = (
                SELECT id FROM queue_entries
                WHERE key = $1
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn log_append(&self, key: &str, score: i64, value: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO log_entries (key, score, value) VALUES ($1, $2, $3)")
            .bind(key)
            .bind(score)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn log_entries(&self, key: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT value FROM log_entries WHERE key = $1 ORDER BY score, id")
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| r.get::<String, _>("value"))
            .collect())
    }
}
