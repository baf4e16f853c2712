//! Allowed-category cache
//!
//! Answers "is this category link-only?" from a cached set of category ids.
//! The set is rebuilt from the category store on the first read after an
//! invalidation. There is no TTL: every category write must call
//! [`CategoryPolicyCache::invalidate`].

use std::sync::Arc;

use crate::model::CategoryId;
use crate::ports::{CategorySet, CategorySetCache, CategoryStore, StoreError};

/// Cache namespace shared by every instance of the service
pub const CACHE_NAMESPACE: &str = "allowed_links_category";

/// Key of the allowed set inside [`CACHE_NAMESPACE`]
pub const ALLOWED_KEY: &str = "allowed";

/// Policy cache service, constructed once and injected where needed
pub struct CategoryPolicyCache {
    cache: Arc<dyn CategorySetCache>,
    source: Arc<dyn CategoryStore>,
}

impl CategoryPolicyCache {
    pub fn new(cache: Arc<dyn CategorySetCache>, source: Arc<dyn CategoryStore>) -> Self {
        Self { cache, source }
    }

    /// Drop the cached set; the next read rebuilds it
    pub async fn invalidate(&self) {
        self.cache.delete(ALLOWED_KEY).await;
        tracing::debug!(namespace = CACHE_NAMESPACE, "Invalidated allowed categories");
    }

    pub async fn is_link_category(&self, category_id: CategoryId) -> Result<bool, StoreError> {
        Ok(self.allowed_categories().await?.contains(&category_id))
    }

    /// `false` for uncategorized topics
    pub async fn is_link_category_opt(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<bool, StoreError> {
        match category_id {
            Some(id) => self.is_link_category(id).await,
            None => Ok(false),
        }
    }

    /// The whole allowed set, rebuilt on miss
    pub async fn allowed_categories(&self) -> Result<CategorySet, StoreError> {
        if let Some(allowed) = self.cache.get(ALLOWED_KEY).await {
            return Ok(allowed);
        }
        self.rebuild().await
    }

    async fn rebuild(&self) -> Result<CategorySet, StoreError> {
        let allowed: CategorySet = self.source.link_category_ids().await?.into_iter().collect();

        tracing::debug!(
            allowed = ?allowed,
            "Rebuilt allowed categories"
        );

        self.cache.set(ALLOWED_KEY, allowed.clone()).await;
        Ok(allowed)
    }
}
