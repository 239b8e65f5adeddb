//! Repopulation leases over the shared cache.
//!
//! A lease is a cache entry under `<cache key>:lock` whose value is a random
//! token. Acquisition is the cache's atomic set-if-absent; release is its
//! atomic compare-and-delete with the same token, so a holder whose lease
//! already expired can never delete a lease someone else acquired since.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::ports::SharedCache;

/// One successful acquisition of a lock key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub lock_key: String,
    pub token: String,
    pub ttl: Duration,
}

impl Lease {
    fn with_fresh_token(lock_key: &str, ttl: Duration) -> Self {
        Self {
            lock_key: lock_key.to_string(),
            token: Uuid::new_v4().to_string(),
            ttl,
        }
    }
}

/// Acquires and releases token-fenced leases in a shared cache.
pub struct LockCoordinator<C: SharedCache + ?Sized + 'static> {
    cache: Arc<C>,
}

impl<C: SharedCache + ?Sized + 'static> Clone for LockCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: SharedCache + ?Sized + 'static> LockCoordinator<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }

    /// Try to take the lease on `lock_key` for `ttl`.
    ///
    /// Returns `None` when another holder has a live lease.
    pub async fn try_acquire(&self, lock_key: &str, ttl: Duration) -> DomainResult<Option<LeaseGuard<C>>> {
        let lease = Lease::with_fresh_token(lock_key, ttl);

        if self.cache.set_if_absent(lock_key, lease.token.as_bytes(), ttl).await? {
            debug!(lock_key, ttl_ms = ttl.as_millis() as u64, "lease acquired");
            Ok(Some(LeaseGuard::new(Arc::clone(&self.cache), lease)))
        } else {
            debug!(lock_key, "lease held elsewhere");
            Ok(None)
        }
    }

    /// Delete the lease iff it still carries `lease.token`.
    ///
    /// Returns false when the lease expired or now belongs to another holder.
    pub async fn release(&self, lease: &Lease) -> DomainResult<bool> {
        self.cache
            .compare_and_delete(&lease.lock_key, lease.token.as_bytes())
            .await
    }
}

/// Owned lease that is released on every exit path.
///
/// Call [`LeaseGuard::release`] on the normal path. If the guard is dropped
/// while still holding the lease (for example because the owning future was
/// cancelled), the release is spawned on the current Tokio runtime.
pub struct LeaseGuard<C: SharedCache + ?Sized + 'static> {
    cache: Arc<C>,
    lease: Option<Lease>,
}

impl<C: SharedCache + ?Sized + 'static> LeaseGuard<C> {
    fn new(cache: Arc<C>, lease: Lease) -> Self {
        Self {
            cache,
            lease: Some(lease),
        }
    }

    pub fn lease(&self) -> Option<&Lease> {
        self.lease.as_ref()
    }

    /// Release the lease with compare-and-delete.
    pub async fn release(mut self) -> DomainResult<bool> {
        let Some(lease) = self.lease.as_ref() else {
            return Ok(false);
        };

        let released = self
            .cache
            .compare_and_delete(&lease.lock_key, lease.token.as_bytes())
            .await;

        // Only disarm after the call finished; a cancelled release still
        // falls through to Drop.
        self.lease = None;
        released
    }
}

impl<C: SharedCache + ?Sized + 'static> Drop for LeaseGuard<C> {
    fn drop(&mut self) {
        let Some(lease) = self.lease.take() else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(lock_key = %lease.lock_key, "no runtime to release lease; it will expire by TTL");
            return;
        };

        let cache = Arc::clone(&self.cache);
        runtime.spawn(async move {
            match cache
                .compare_and_delete(&lease.lock_key, lease.token.as_bytes())
                .await
            {
                Ok(released) => {
                    debug!(lock_key = %lease.lock_key, released, "lease released from drop");
                }
                Err(err) => {
                    warn!(lock_key = %lease.lock_key, error = %err, "failed to release dropped lease");
                }
            }
        });
    }
}
