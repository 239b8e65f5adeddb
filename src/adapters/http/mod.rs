//! HTTP API adapters.

pub mod products_http;

pub use products_http::{CreateProductRequest, ProductResponse, ProductsHttpServer, ValidProduct};
