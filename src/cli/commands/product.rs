//! Product CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::build_product_service;
use crate::adapters::http::{CreateProductRequest, ProductResponse};
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ProductArgs {
    #[command(subcommand)]
    pub command: ProductCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// Create a product in the backing store
    Create {
        /// Product name (3-50 characters)
        #[arg(short, long)]
        name: String,
        /// Product description (10-200 characters)
        #[arg(short, long)]
        description: String,
        /// Price (at least 10.0)
        #[arg(short, long)]
        price: f64,
    },
    /// Read a product through the cache
    Get {
        /// Product ID
        id: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ProductCreatedOutput {
    pub id: Uuid,
}

impl CommandOutput for ProductCreatedOutput {
    fn to_human(&self) -> String {
        format!("Product created: {}", self.id)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ProductDetailOutput {
    pub id: Uuid,
    #[serde(flatten)]
    pub product: ProductResponse,
}

impl CommandOutput for ProductDetailOutput {
    fn to_human(&self) -> String {
        [
            format!("Product: {}", self.product.name),
            format!("ID: {}", self.id),
            format!("Description: {}", self.product.description),
            format!("Price: {:.2}", self.product.price),
            format!("Launched: {}", self.product.launched_at),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ProductArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        ProductCommands::Create { name, description, price } => {
            let request = CreateProductRequest {
                name: Some(name),
                description: Some(description),
                price: Some(price),
            };
            let valid = request.validate().map_err(|errors| {
                let details = errors
                    .iter()
                    .map(|(field, reason)| format!("{field} {reason}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                DomainError::ValidationFailed(details)
            })?;

            let (service, _cache) = build_product_service(config).await?;
            let id = service
                .create_product(valid.name, valid.description, valid.price)
                .await?;
            output(&ProductCreatedOutput { id }, json_mode);
        }

        ProductCommands::Get { id } => {
            let (service, _cache) = build_product_service(config).await?;
            let product = service.get_product_by_id(id).await?;
            let out = ProductDetailOutput {
                id: product.id,
                product: ProductResponse::from(product),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::domain::models::Product;

    #[test]
    fn test_detail_output_flattens_product_fields() {
        let launched = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let product = Product {
            launched_at: launched,
            ..Product::new("Desk Lamp", "Warm light for late nights", 24.5)
        };
        let out = ProductDetailOutput {
            id: product.id,
            product: ProductResponse::from(product.clone()),
        };

        let json = out.to_json();
        assert_eq!(json["id"], product.id.to_string());
        assert_eq!(json["name"], "Desk Lamp");
        assert_eq!(json["price"], 24.5);
        assert!(out.to_human().contains("Price: 24.50"));
    }
}
