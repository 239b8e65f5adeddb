//! Domain layer for thunderguard
//!
//! Entity models, configuration models, errors, and the ports the
//! repopulation protocol is written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
