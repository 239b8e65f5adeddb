//! Thunderguard - read-through product cache with stampede protection
//!
//! Reads go to a shared cache first. On a miss, exactly one caller across all
//! processes holds a short-lived lease on the entry and repopulates it from
//! the backing store; concurrent callers wait briefly for the backfill and
//! fall back to a direct store read if it does not arrive.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the store/cache ports
//! - **Service Layer** (`services`): lease coordination and repopulation
//! - **Adapters** (`adapters`): SQLite store and cache, in-memory cache, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use thunderguard::adapters::cache::InMemorySharedCache;
//! use thunderguard::adapters::sqlite::{initialize_database, SqliteProductRepository};
//! use thunderguard::services::{ProductService, RepopulationPolicy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = initialize_database("sqlite:products.db", None).await?;
//!     let service = ProductService::new(
//!         Arc::new(SqliteProductRepository::new(pool)),
//!         Arc::new(InMemorySharedCache::new()),
//!         RepopulationPolicy::default(),
//!     );
//!     let id = service.create_product("Desk Lamp".into(), "Warm light for late nights".into(), 24.5).await?;
//!     let product = service.get_product_by_id(id).await?;
//!     println!("{}", product.name);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CacheBackend, CacheConfig, CachedEntity, Config, DatabaseConfig, LoggingConfig, Product,
    ServerConfig, StampedeConfig,
};
pub use domain::ports::{BackingStore, SharedCache};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Lease, LeaseGuard, LockCoordinator, ProductService, RepopulationCoordinator,
    RepopulationPolicy,
};
