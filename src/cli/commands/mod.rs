//! CLI command implementations.

pub mod product;
pub mod serve;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::cache::open_shared_cache;
use crate::adapters::sqlite::{database_url, initialize_database, PoolConfig, SqliteProductRepository};
use crate::domain::models::Config;
use crate::domain::ports::SharedCache;
use crate::services::{ProductService, RepopulationPolicy};

/// The product service as wired by the CLI: SQLite store, configured cache.
pub type AppProductService = ProductService<SqliteProductRepository, dyn SharedCache>;

/// Open the product store and shared cache named in `config`.
///
/// The cache is returned alongside the service so long-running commands can
/// attach an expiry sweeper to it.
pub async fn build_product_service(config: &Config) -> Result<(Arc<AppProductService>, Arc<dyn SharedCache>)> {
    let pool = initialize_database(
        &database_url(&config.database.path),
        Some(PoolConfig::from(&config.database)),
    )
    .await
    .with_context(|| format!("Failed to open product database at {}", config.database.path))?;

    let cache = open_shared_cache(&config.cache)
        .await
        .with_context(|| format!("Failed to open {} shared cache", config.cache.backend.as_str()))?;

    let store = Arc::new(SqliteProductRepository::new(pool));
    let policy = RepopulationPolicy::from_config(config);

    tracing::debug!(
        cache_backend = config.cache.backend.as_str(),
        entry_ttl_secs = policy.entry_ttl.as_secs(),
        lock_ttl_ms = u64::try_from(policy.lock_ttl.as_millis()).unwrap_or(u64::MAX),
        retry_attempts = policy.retry_attempts,
        "product service wired"
    );

    let service = Arc::new(ProductService::new(store, Arc::clone(&cache), policy));
    Ok((service, cache))
}
