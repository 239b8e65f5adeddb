//! SQLite implementation of the product backing store.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Product;
use crate::domain::ports::BackingStore;

#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl BackingStore for SqliteProductRepository {
    type Entity = Product;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, price, launched_at FROM products WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn put(&self, product: &Product) -> DomainResult<Uuid> {
        sqlx::query(
            r#"INSERT INTO products (id, name, description, price, launched_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   description = excluded.description,
                   price = excluded.price,
                   launched_at = excluded.launched_at"#
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.launched_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(product.id)
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: f64,
    launched_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: parse_uuid(&row.id)?,
            name: row.name,
            description: row.description,
            price: row.price,
            launched_at: parse_datetime(&row.launched_at)?,
        })
    }
}
