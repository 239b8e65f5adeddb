//! Read-through cache repopulation with stampede control.
//!
//! On a cache miss exactly one caller per key (the lease winner) reads the
//! backing store and backfills the cache. Every other caller (a loser)
//! re-checks the cache on a fixed schedule and, if the winner has not
//! backfilled by the end of it, reads the store directly. The fallback read
//! bounds loser latency; it is not covered by the lease.
//!
//! Cache faults fail open toward the store. Store faults are returned to the
//! caller. A lease, once taken, is released on every exit path including
//! cancellation (see [`LeaseGuard`]).

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::lock_coordinator::{LeaseGuard, LockCoordinator};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CachedEntity, Config};
use crate::domain::ports::{BackingStore, SharedCache};

/// Timing policy for repopulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepopulationPolicy {
    /// Lifetime of backfilled cache entries.
    pub entry_ttl: Duration,
    /// Lifetime of the repopulation lease.
    pub lock_ttl: Duration,
    /// Cache re-checks a loser performs before falling back.
    pub retry_attempts: u32,
    /// Sleep before each loser re-check.
    pub retry_delay: Duration,
}

impl Default for RepopulationPolicy {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(600),
            lock_ttl: Duration::from_secs(10),
            retry_attempts: 10,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl RepopulationPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            entry_ttl: config.cache.entry_ttl(),
            lock_ttl: Duration::from_millis(config.stampede.lock_ttl_ms),
            retry_attempts: config.stampede.retry_attempts,
            retry_delay: Duration::from_millis(config.stampede.retry_delay_ms),
        }
    }

    /// Longest time a loser waits before its fallback read.
    pub fn max_loser_wait(&self) -> Duration {
        self.retry_delay.saturating_mul(self.retry_attempts)
    }
}

/// Read-through fetch of `S::Entity` with one repopulating caller per key.
pub struct RepopulationCoordinator<S, C>
where
    S: BackingStore + ?Sized,
    C: SharedCache + ?Sized + 'static,
{
    store: Arc<S>,
    cache: Arc<C>,
    locks: LockCoordinator<C>,
    policy: RepopulationPolicy,
}

impl<S, C> RepopulationCoordinator<S, C>
where
    S: BackingStore + ?Sized,
    S::Entity: CachedEntity,
    C: SharedCache + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, policy: RepopulationPolicy) -> Self {
        let locks = LockCoordinator::new(Arc::clone(&cache));
        Self {
            store,
            cache,
            locks,
            policy,
        }
    }

    /// Fetch an entity through the cache.
    ///
    /// Fails with `DomainError::NotFound` when the store has no such entity,
    /// whichever path (hit, winner, loser fallback) the call took.
    #[instrument(skip(self), fields(kind = <S::Entity as CachedEntity>::KIND))]
    pub async fn fetch(&self, id: Uuid) -> DomainResult<S::Entity> {
        let cache_key = <S::Entity as CachedEntity>::cache_key(id);
        if let Some(entity) = self.lookup(&cache_key).await {
            debug!("cache hit");
            return Ok(entity);
        }

        let lock_key = <S::Entity as CachedEntity>::lock_key(id);
        match self.locks.try_acquire(&lock_key, self.policy.lock_ttl).await {
            Ok(Some(guard)) => self.repopulate(id, &cache_key, guard).await,
            Ok(None) => self.wait_for_repopulation(id, &cache_key).await,
            Err(err) => {
                // Without a lease answer we cannot tell whether anyone is
                // repopulating, so waiting would only add latency.
                warn!(error = %err, "lease acquisition failed, reading store directly");
                self.load(id).await
            }
        }
    }

    /// Winner path. The guard is released before returning, whatever the
    /// outcome of the locked section.
    async fn repopulate(&self, id: Uuid, cache_key: &str, guard: LeaseGuard<C>) -> DomainResult<S::Entity> {
        let result = self.repopulate_locked(id, cache_key).await;

        match guard.release().await {
            Ok(true) => debug!("lease released"),
            Ok(false) => warn!("lease expired before release"),
            Err(err) => warn!(error = %err, "lease release failed; it will expire by TTL"),
        }

        result
    }

    async fn repopulate_locked(&self, id: Uuid, cache_key: &str) -> DomainResult<S::Entity> {
        // Another process may have backfilled between our miss and the lease.
        if let Some(entity) = self.lookup(cache_key).await {
            debug!("cache hit after acquiring lease");
            return Ok(entity);
        }

        let entity = self.load(id).await?;
        self.backfill(cache_key, &entity).await;
        Ok(entity)
    }

    /// Loser path: poll the cache, then fall back to the store.
    async fn wait_for_repopulation(&self, id: Uuid, cache_key: &str) -> DomainResult<S::Entity> {
        for attempt in 1..=self.policy.retry_attempts {
            tokio::time::sleep(self.policy.retry_delay).await;

            if let Some(entity) = self.lookup(cache_key).await {
                debug!(attempt, "cache hit while waiting for repopulation");
                return Ok(entity);
            }
        }

        info!(
            attempts = self.policy.retry_attempts,
            "repopulation wait exhausted, falling back to store"
        );
        self.load(id).await
    }

    /// Cache read that never fails: faults and corrupt snapshots are misses.
    #[instrument(name = "cache_lookup", level = "debug", skip(self))]
    async fn lookup(&self, cache_key: &str) -> Option<S::Entity> {
        match self.cache.get(cache_key).await {
            Ok(Some(bytes)) => match <S::Entity as CachedEntity>::from_snapshot(&bytes) {
                Ok(entity) => Some(entity),
                Err(err) => {
                    warn!(error = %err, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    #[instrument(name = "store_lookup", level = "debug", skip(self))]
    async fn load(&self, id: Uuid) -> DomainResult<S::Entity> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(<S::Entity as CachedEntity>::DISPLAY_NAME, id))
    }

    #[instrument(name = "cache_backfill", level = "debug", skip(self, entity))]
    async fn backfill(&self, cache_key: &str, entity: &S::Entity) {
        let snapshot = match entity.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "cannot serialize entity for backfill");
                return;
            }
        };

        if let Err(err) = self.cache.set(cache_key, &snapshot, self.policy.entry_ttl).await {
            warn!(error = %err, "cache backfill failed");
        }
    }
}
