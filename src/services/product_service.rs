//! Product service: the read API in front of the repopulation coordinator.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repopulation_coordinator::{RepopulationCoordinator, RepopulationPolicy};
use crate::domain::errors::DomainResult;
use crate::domain::models::Product;
use crate::domain::ports::{BackingStore, SharedCache};

pub struct ProductService<S, C>
where
    S: BackingStore<Entity = Product> + ?Sized,
    C: SharedCache + ?Sized + 'static,
{
    store: Arc<S>,
    coordinator: RepopulationCoordinator<S, C>,
}

impl<S, C> ProductService<S, C>
where
    S: BackingStore<Entity = Product> + ?Sized,
    C: SharedCache + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, policy: RepopulationPolicy) -> Self {
        let coordinator = RepopulationCoordinator::new(Arc::clone(&store), cache, policy);
        Self { store, coordinator }
    }

    /// Persist a new product. Writes go straight to the store; the cache is
    /// populated lazily by the first read.
    #[instrument(skip(self, description))]
    pub async fn create_product(&self, name: String, description: String, price: f64) -> DomainResult<Uuid> {
        let product = Product::new(name, description, price);
        let id = self.store.put(&product).await?;
        info!(product_id = %id, "product created");
        Ok(id)
    }

    /// Get a product through the read-through cache.
    pub async fn get_product_by_id(&self, id: Uuid) -> DomainResult<Product> {
        self.coordinator.fetch(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemorySharedCache;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteProductRepository};
    use crate::domain::errors::DomainError;
    use crate::domain::models::CachedEntity;

    async fn setup_service() -> (
        ProductService<SqliteProductRepository, InMemorySharedCache>,
        Arc<InMemorySharedCache>,
    ) {
        let pool = create_migrated_test_pool().await.unwrap();
        let store = Arc::new(SqliteProductRepository::new(pool));
        let cache = Arc::new(InMemorySharedCache::new());
        let service = ProductService::new(store, Arc::clone(&cache), RepopulationPolicy::default());
        (service, cache)
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_fields() {
        let (service, cache) = setup_service().await;

        let id = service
            .create_product("Test Product".to_string(), "Test Description".to_string(), 100.0)
            .await
            .unwrap();
        assert_eq!(cache.get(&Product::cache_key(id)).await.unwrap(), None);

        let cold = service.get_product_by_id(id).await.unwrap();
        let warm = service.get_product_by_id(id).await.unwrap();

        assert_eq!(cold.id, id);
        assert_eq!(cold.name, "Test Product");
        assert_eq!(cold.description, "Test Description");
        assert!((cold.price - 100.0).abs() < f64::EPSILON);
        assert_eq!(warm, cold);
    }

    #[tokio::test]
    async fn test_get_unknown_product_is_not_found() {
        let (service, _) = setup_service().await;
        let id = Uuid::new_v4();

        let err = service.get_product_by_id(id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(err.to_string(), format!("Product with id {id} not found"));
    }
}
