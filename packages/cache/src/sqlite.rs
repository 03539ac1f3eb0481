// ABOUTME: SQLite-backed generation cache that survives process restarts
// ABOUTME: Rows carry an absolute unix expiry; expired rows are skipped on read

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::{CacheResult, KeyValueCache};

/// Persistent cache over the `generation_cache` table.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// The pool must have the `generation_cache` table migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete every expired row, returning how many were removed.
    pub async fn purge_expired(&self) -> CacheResult<u64> {
        let result = sqlx::query("DELETE FROM generation_cache WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "purged expired cache rows");
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl KeyValueCache for SqliteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM generation_cache WHERE key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;

        sqlx::query(
            r#"
            INSERT INTO generation_cache (key, value, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                created_at = excluded.created_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        sqlx::query("DELETE FROM generation_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
