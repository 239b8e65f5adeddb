//! Domain models for thunderguard.

pub mod cached;
pub mod config;
pub mod product;

pub use cached::{CachedEntity, LOCK_KEY_SUFFIX};
pub use config::{
    CacheBackend, CacheConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig,
    StampedeConfig,
};
pub use product::Product;
