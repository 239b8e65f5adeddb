//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - BackingStore: authoritative entity persistence
//! - SharedCache: cross-process key/value cache with atomic conditional writes
//!
//! These traits keep the repopulation protocol independent of any concrete
//! database or cache backend.

pub mod backing_store;
pub mod shared_cache;

pub use backing_store::BackingStore;
pub use shared_cache::SharedCache;
