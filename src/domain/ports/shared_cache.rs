//! Shared cache port.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::DomainResult;

/// Key/value store with per-entry TTL, visible to every process instance.
///
/// `set_if_absent` and `compare_and_delete` must each be a single atomic
/// operation on the backend; the repopulation lease depends on it.
/// Expired entries behave exactly like absent ones.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Get the live value under `key`.
    async fn get(&self, key: &str) -> DomainResult<Option<Vec<u8>>>;

    /// Unconditionally store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<()>;

    /// Store `value` only if no live entry exists. Returns true when stored.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<bool>;

    /// Delete `key` only if its live value equals `expected`. Returns true when deleted.
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> DomainResult<bool>;

    /// Remaining time to live of a live entry.
    async fn ttl(&self, key: &str) -> DomainResult<Option<Duration>>;

    /// Physically delete every expired entry. Returns the number removed.
    async fn purge_expired(&self) -> DomainResult<u64>;
}
