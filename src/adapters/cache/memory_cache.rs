//! In-process shared cache.
//!
//! Implements the `SharedCache` contract over a mutex-guarded map. Every
//! primitive runs inside one critical section, which gives the same
//! atomicity the SQLite backend gets from single statements. Only tasks in
//! the same process can see it, so it suits single-instance deployments and
//! tests.
//!
//! Expiry uses `tokio::time::Instant`, so tests can drive it with a paused
//! clock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::errors::DomainResult;
use crate::domain::ports::SharedCache;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &[u8], now: Instant, ttl: Duration) -> Self {
        Self {
            value: value.to_vec(),
            expires_at: deadline(now, ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Roughly thirty years; stands in for TTLs too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Live entry under `key`. An expired entry is removed on sight.
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str, now: Instant) -> Option<&'a Entry> {
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        entries.remove(key);
    }
    entries.get(key)
}

/// Process-local `SharedCache` over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemorySharedCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemorySharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SharedCache for InMemorySharedCache {
    async fn get(&self, key: &str) -> DomainResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key, now).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<()> {
        let entry = Entry::new(value, Instant::now(), ttl);
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> DomainResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if live_entry(&mut entries, key, now).is_some() {
            return Ok(false);
        }

        entries.insert(key.to_string(), Entry::new(value, now, ttl));
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> DomainResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let matches = live_entry(&mut entries, key, now).is_some_and(|entry| entry.value == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }

    async fn ttl(&self, key: &str) -> DomainResult<Option<Duration>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key, now).map(|entry| entry.expires_at - now))
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}
