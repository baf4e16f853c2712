//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and the host forum.
//! Adapters implement these traits to connect to real infrastructure.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    Category, CategoryId, NewCategory, NewLinkTopic, NewUser, Post, Topic, TopicId, User, UserId,
};

/// Error type for persistence operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Port for category persistence, the authoritative source of link policy
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Ids of every category flagged link-only
    async fn link_category_ids(&self) -> Result<Vec<CategoryId>, StoreError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StoreError>;

    /// Persist an existing category (name and link policy)
    async fn save_category(&self, category: &Category) -> Result<(), StoreError>;
}

/// Port for user lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;
}

/// Port for topic and post persistence
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Create the topic and its first post atomically
    async fn create_link_topic(&self, topic: &NewLinkTopic) -> Result<(Topic, Post), StoreError>;

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError>;

    /// Persist tracked topic fields (title, category, featured link)
    async fn update_topic(&self, topic: &Topic) -> Result<(), StoreError>;

    async fn posts_for_topic(&self, id: TopicId) -> Result<Vec<Post>, StoreError>;

    /// Newest first
    async fn latest_topics(&self, limit: usize) -> Result<Vec<Topic>, StoreError>;

    /// Visible topics only, newest first. `None` spans every category.
    async fn visible_topics(
        &self,
        category_id: Option<CategoryId>,
        limit: usize,
    ) -> Result<Vec<Topic>, StoreError>;

    /// Newest first
    async fn topics_by_user(&self, user_id: UserId) -> Result<Vec<Topic>, StoreError>;
}

/// Set of category ids held by the shared cache
pub type CategorySet = BTreeSet<CategoryId>;

/// Port for the distributed cache holding the allowed-category set.
///
/// Implementations guarantee atomic get/set/delete per key and nothing
/// across keys. Backend failures surface as misses.
#[async_trait]
pub trait CategorySetCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<CategorySet>;

    async fn set(&self, key: &str, value: CategorySet);

    async fn delete(&self, key: &str);
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
