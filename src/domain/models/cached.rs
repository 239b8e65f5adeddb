//! Entities that can be served through the read-through cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// Suffix appended to a cache key to form its repopulation lock key.
pub const LOCK_KEY_SUFFIX: &str = ":lock";

/// An entity the repopulation coordinator can cache.
///
/// Cache keys are `"{KIND}:{id}"` and lock keys are `"{KIND}:{id}:lock"`.
/// Cached values are JSON snapshots of the entity.
pub trait CachedEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Key prefix, e.g. `product`.
    const KIND: &'static str;

    /// Human-facing name used in not-found errors.
    const DISPLAY_NAME: &'static str;

    fn cache_key(id: Uuid) -> String {
        format!("{}:{}", Self::KIND, id)
    }

    fn lock_key(id: Uuid) -> String {
        format!("{}{}", Self::cache_key(id), LOCK_KEY_SUFFIX)
    }

    fn to_snapshot(&self) -> DomainResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_snapshot(bytes: &[u8]) -> DomainResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
