//! links-category domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `link`: Featured link normalization
//! - `cache`: Allowed-category policy cache
//! - `policy`: Category move and featured link guards, permissions
//! - `usecases`: Application use cases / business logic

pub mod cache;
pub mod link;
pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

#[cfg(test)]
mod testing;

pub use cache::CategoryPolicyCache;
pub use link::{InvalidLinkError, NormalizedUrl, domain_of, normalize};
pub use model::*;
pub use ports::*;
