//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use thunderguard::adapters::sqlite::{create_migrated_test_pool, SqliteProductRepository};
use thunderguard::domain::errors::DomainResult;
use thunderguard::domain::models::Product;
use thunderguard::domain::ports::BackingStore;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a temporary database path inside its own directory.
pub fn temp_db_path(name: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join(name);
    (dir, db_path)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A product with valid field values.
pub fn sample_product(name: &str) -> Product {
    Product::new(name, "A sturdy item for everyday use", 42.0)
}

/// SQLite product store that counts reads and can be slowed down.
///
/// Clones share the same read counter, so several coordinators standing in
/// for separate processes can be checked against one total.
#[derive(Clone)]
pub struct CountingStore {
    inner: Arc<SqliteProductRepository>,
    reads: Arc<AtomicUsize>,
    latency: Duration,
}

impl CountingStore {
    pub fn new(inner: SqliteProductRepository, latency: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            reads: Arc::new(AtomicUsize::new(0)),
            latency,
        }
    }

    /// Same counter, different underlying repository.
    pub fn sharing_counter(&self, inner: SqliteProductRepository) -> Self {
        Self {
            inner: Arc::new(inner),
            reads: Arc::clone(&self.reads),
            latency: self.latency,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackingStore for CountingStore {
    type Entity = Product;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Product>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.inner.get(id).await
    }

    async fn put(&self, entity: &Product) -> DomainResult<Uuid> {
        self.inner.put(entity).await
    }
}

/// In-memory SQLite product store wrapped in a read counter.
pub async fn counting_memory_store(latency: Duration) -> CountingStore {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test pool");
    CountingStore::new(SqliteProductRepository::new(pool), latency)
}
