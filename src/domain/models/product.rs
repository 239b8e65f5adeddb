//! Product domain model.
//!
//! Products are the entities served through the read-through cache. Once
//! fetched from the backing store a product is treated as an immutable
//! snapshot; the repopulation path never mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cached::CachedEntity;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub launched_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product launched now.
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            price,
            launched_at: Utc::now(),
        }
    }
}

impl CachedEntity for Product {
    const KIND: &'static str = "product";
    const DISPLAY_NAME: &'static str = "Product";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys() {
        let id = Uuid::parse_str("6f1f2c7e-9c0e-4c43-8f43-1f6c0f5b2a10").unwrap();
        assert_eq!(
            Product::cache_key(id),
            "product:6f1f2c7e-9c0e-4c43-8f43-1f6c0f5b2a10"
        );
        assert_eq!(
            Product::lock_key(id),
            "product:6f1f2c7e-9c0e-4c43-8f43-1f6c0f5b2a10:lock"
        );
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_fields() {
        let product = Product::new("Desk Lamp", "Warm white reading lamp", 42.5);
        let bytes = product.to_snapshot().unwrap();
        let restored = Product::from_snapshot(&bytes).unwrap();
        assert_eq!(restored, product);
    }
}
