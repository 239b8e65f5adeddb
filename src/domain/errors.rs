//! Domain errors for the thunderguard read-through cache.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while serving cached entities.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The identifier has no corresponding row in the backing store.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: String, id: Uuid },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The backing store could not be reached or rejected the query.
    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(String),

    /// The shared cache could not be reached or rejected the command.
    #[error("Shared cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    pub fn not_found(entity: impl Into<String>, id: Uuid) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let id = Uuid::new_v4();
        let err = DomainError::not_found("Product", id);
        assert_eq!(err.to_string(), format!("Product with id {id} not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sqlx_errors_map_to_store_unavailable() {
        let err: DomainError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DomainError::StoreUnavailable(_)));
        assert!(!err.is_not_found());
    }
}
