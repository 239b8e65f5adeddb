//! Products HTTP server.
//!
//! Exposes product creation and cached product reads over REST.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{Product, ServerConfig};
use crate::domain::ports::{BackingStore, SharedCache};
use crate::services::ProductService;

/// Request to create a product.
///
/// Fields are optional on the wire so that absent and `null` values reach
/// `validate` and come back as field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Minimum accepted price.
pub const MIN_PRICE: f64 = 10.0;

const NOT_NULL: &str = "must not be null";

impl CreateProductRequest {
    /// Field-level validation. Returns one message per offending field.
    pub fn validate(self) -> Result<ValidProduct, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();

        let name = check_text(self.name, 3, 50).map_err(|reason| errors.insert("name".to_string(), reason));
        let description = check_text(self.description, 10, 200)
            .map_err(|reason| errors.insert("description".to_string(), reason));
        let price = check_price(self.price).map_err(|reason| errors.insert("price".to_string(), reason));

        match (name, description, price) {
            (Ok(name), Ok(description), Ok(price)) => Ok(ValidProduct {
                name,
                description,
                price,
            }),
            _ => Err(errors),
        }
    }
}

fn check_text(value: Option<String>, min: usize, max: usize) -> Result<String, String> {
    let value = value.ok_or_else(|| NOT_NULL.to_string())?;
    if value.trim().is_empty() {
        return Err("must not be blank".to_string());
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!("size must be between {min} and {max}"));
    }
    Ok(value)
}

fn check_price(value: Option<f64>) -> Result<f64, String> {
    let price = value.ok_or_else(|| NOT_NULL.to_string())?;
    if !price.is_finite() || price < MIN_PRICE {
        return Err(format!("must be at least {MIN_PRICE:.1}"));
    }
    Ok(price)
}

fn validation_failed(errors: BTreeMap<String, String>) -> axum::response::Response {
    use axum::response::IntoResponse;

    let body = ValidationErrorResponse {
        message: "Validation failed".to_string(),
        errors,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Response with a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub launched_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            name: p.name,
            description: p.description,
            price: p.price,
            launched_at: p.launched_at.to_rfc3339(),
        }
    }
}

/// Validation failure body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: BTreeMap<String, String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &DomainError) -> ApiError {
    let (status, code) = match err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        DomainError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
        DomainError::CacheUnavailable(_) | DomainError::SerializationError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

struct AppState<S, C>
where
    S: BackingStore<Entity = Product> + ?Sized,
    C: SharedCache + ?Sized + 'static,
{
    service: Arc<ProductService<S, C>>,
}

/// Products HTTP Server.
pub struct ProductsHttpServer<S, C>
where
    S: BackingStore<Entity = Product> + ?Sized + 'static,
    C: SharedCache + ?Sized + 'static,
{
    config: ServerConfig,
    service: Arc<ProductService<S, C>>,
}

impl<S, C> ProductsHttpServer<S, C>
where
    S: BackingStore<Entity = Product> + ?Sized + 'static,
    C: SharedCache + ?Sized + 'static,
{
    pub fn new(service: Arc<ProductService<S, C>>, config: ServerConfig) -> Self {
        Self { config, service }
    }

    /// Build the router.
    pub fn router(self) -> Router {
        let state = Arc::new(AppState {
            service: self.service,
        });

        let app = Router::new()
            .route("/api/v1/products", post(create_product::<S, C>))
            .route("/api/v1/products/{id}", get(get_product::<S, C>))
            .route("/health", get(health_check))
            .with_state(state);

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "products HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_product<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<Json<Uuid>, axum::response::Response>
where
    S: BackingStore<Entity = Product> + ?Sized + 'static,
    C: SharedCache + ?Sized + 'static,
{
    use axum::response::IntoResponse;

    let Json(req) = payload.map_err(|rejection| {
        validation_failed(BTreeMap::from([("body".to_string(), rejection.body_text())]))
    })?;
    let valid = req.validate().map_err(validation_failed)?;

    state
        .service
        .create_product(valid.name, valid.description, valid.price)
        .await
        .map(Json)
        .map_err(|e| api_error(&e).into_response())
}

async fn get_product<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError>
where
    S: BackingStore<Entity = Product> + ?Sized + 'static,
    C: SharedCache + ?Sized + 'static,
{
    match state.service.get_product_by_id(id).await {
        Ok(product) => Ok(Json(ProductResponse::from(product))),
        Err(e) => Err(api_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(name: &str, description: &str, price: f64) -> CreateProductRequest {
        CreateProductRequest {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            price: Some(price),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let valid = request("Test Product", "Test Description", 10.0).validate().unwrap();
        assert_eq!(valid.name, "Test Product");
        assert_eq!(valid.price, 10.0);
    }

    #[test]
    fn test_missing_fields_must_not_be_null() {
        let body = r#"{"name":"Test Product","description":null}"#;
        let req: CreateProductRequest = serde_json::from_str(body).unwrap();

        let errors = req.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("description").map(String::as_str), Some("must not be null"));
        assert_eq!(errors.get("price").map(String::as_str), Some("must not be null"));
    }

    #[test]
    fn test_invalid_request_reports_every_field() {
        let errors = request("", "desc", 9.0).validate().unwrap_err();

        assert_eq!(errors.get("name").map(String::as_str), Some("must not be blank"));
        assert_eq!(
            errors.get("description").map(String::as_str),
            Some("size must be between 10 and 200")
        );
        assert!(errors.contains_key("price"));
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(request("ab", "Long enough description", 20.0).validate().is_err());
        assert!(request("abc", "Long enough description", 20.0).validate().is_ok());
        assert!(request(&"x".repeat(51), "Long enough description", 20.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_price_rejected() {
        assert!(request("Lamp", "Long enough description", f64::NAN).validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_names_within_bounds_are_accepted(name in "[A-Za-z][A-Za-z0-9 ]{1,48}[A-Za-z0-9]") {
            prop_assert!(request(&name, "Long enough description", 10.0).validate().is_ok());
        }

        #[test]
        fn prop_prices_below_minimum_are_rejected(price in -1.0e6f64..MIN_PRICE) {
            let errors = request("Lamp", "Long enough description", price).validate().unwrap_err();
            prop_assert!(errors.contains_key("price"));
            prop_assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        assert_eq!(api_error(&DomainError::not_found("Product", id)).0, StatusCode::NOT_FOUND);
        assert_eq!(
            api_error(&DomainError::StoreUnavailable("down".to_string())).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
