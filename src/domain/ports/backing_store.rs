//! Backing store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// Authoritative source of truth for cached entities.
///
/// Adapters perform no retries; a failed query surfaces as
/// `DomainError::StoreUnavailable`.
#[async_trait]
pub trait BackingStore: Send + Sync {
    type Entity: Send + Sync;

    /// Get an entity by ID. `Ok(None)` when no row exists.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Self::Entity>>;

    /// Insert or update an entity, returning its ID.
    async fn put(&self, entity: &Self::Entity) -> DomainResult<Uuid>;
}
