pub mod lock_coordinator;
pub mod product_service;
pub mod repopulation_coordinator;

pub use lock_coordinator::{Lease, LeaseGuard, LockCoordinator};
pub use product_service::ProductService;
pub use repopulation_coordinator::{RepopulationCoordinator, RepopulationPolicy};
