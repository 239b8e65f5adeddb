//! SQLite-backed shared cache.
//!
//! Every process that opens the same database file sees the same entries.
//! Each primitive is one SQL statement, so conditional set and
//! compare-and-delete are atomic across processes without client-side
//! read-then-write round trips.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::SharedCache;

fn cache_error(err: sqlx::Error) -> DomainError {
    DomainError::CacheUnavailable(err.to_string())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn expires_at(ttl: Duration) -> i64 {
    now_millis().saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

/// `SharedCache` stored in the `cache_entries` table of a SQLite database.
#[derive(Clone)]
pub struct SqliteSharedCache {
    pool: SqlitePool,
}

impl SqliteSharedCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SharedCache for SqliteSharedCache {
    async fn get(&self, key: &str) -> DomainResult<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(now_millis())
                .fetch_optional(&self.pool)
                .await
                .map_err(cache_error)?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at"#
        )
        .bind(key)
        .bind(value)
        .bind(expires_at(ttl))
        .execute(&self.pool)
        .await
        .map_err(cache_error)?;

        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<bool> {
        // An expired row counts as absent and is taken over in place.
        let now = now_millis();
        let result = sqlx::query(
            r#"INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
               WHERE cache_entries.expires_at <= ?"#
        )
        .bind(key)
        .bind(value)
        .bind(expires_at(ttl))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(cache_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> DomainResult<bool> {
        let result = sqlx::query(
            "DELETE FROM cache_entries WHERE key = ? AND value = ? AND expires_at > ?"
        )
        .bind(key)
        .bind(expected)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(cache_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn ttl(&self, key: &str) -> DomainResult<Option<Duration>> {
        let now = now_millis();
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT expires_at FROM cache_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
                .map_err(cache_error)?;

        Ok(row.map(|(expires_at,)| {
            Duration::from_millis(u64::try_from(expires_at - now).unwrap_or_default())
        }))
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(cache_error)?;

        Ok(result.rows_affected())
    }
}
