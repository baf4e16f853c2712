//! links-category adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `state`: SQLite and in-memory forum stores
//! - `cache`: SQLite and in-memory category-set caches
//! - `http`: axum HTTP surface over the use cases

mod cache_memory;
mod cache_sqlite;
mod state_memory;
mod state_sqlite;

pub mod http;

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_memory::InMemoryForumStore;
    pub use crate::state_sqlite::SqliteForumStore;
}

/// Re-exports for cache adapters
pub mod cache {
    pub use crate::cache_memory::InMemoryCategoryCache;
    pub use crate::cache_sqlite::SqliteCategoryCache;
}
