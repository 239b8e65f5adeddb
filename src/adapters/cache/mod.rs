//! Shared cache backends.
//!
//! The SQLite backend (`adapters::sqlite::SqliteSharedCache`) coordinates
//! across processes; the in-memory backend here covers a single process.
//! `open_shared_cache` picks one from configuration.

pub mod memory_cache;

pub use memory_cache::InMemorySharedCache;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::adapters::sqlite::{database_url, initialize_database, DatabaseError, SqliteSharedCache};
use crate::domain::models::{CacheBackend, CacheConfig};
use crate::domain::ports::SharedCache;

/// Build the shared cache selected by `config.backend`.
pub async fn open_shared_cache(config: &CacheConfig) -> Result<Arc<dyn SharedCache>, DatabaseError> {
    match config.backend {
        CacheBackend::Sqlite => {
            let pool = initialize_database(&database_url(&config.path), None).await?;
            Ok(Arc::new(SqliteSharedCache::new(pool)))
        }
        CacheBackend::Memory => Ok(Arc::new(InMemorySharedCache::new())),
    }
}

/// Longest accepted sweep period.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(86_400);

/// Spawn a task that purges expired entries every `every`, clamped to
/// `1ms..=MAX_SWEEP_INTERVAL`.
///
/// The first sweep runs one interval after spawning. Abort the handle to stop it.
pub fn spawn_expiry_sweeper<C>(cache: Arc<C>, every: Duration) -> JoinHandle<()>
where
    C: SharedCache + ?Sized + 'static,
{
    let every = every.clamp(Duration::from_millis(1), MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired cache entries"),
                Err(err) => warn!(error = %err, "cache expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_empties_expired_entries() {
        let cache = Arc::new(InMemorySharedCache::new());
        for i in 0..1000 {
            cache.set(&format!("product:{i}"), b"v", Duration::from_secs(1)).await.unwrap();
        }

        let sweeper = spawn_expiry_sweeper(Arc::clone(&cache), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(cache.len().await, 0);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };

        let cache = open_shared_cache(&config).await.unwrap();
        cache.set("product:1", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("product:1").await.unwrap(), Some(b"v".to_vec()));
    }
}
