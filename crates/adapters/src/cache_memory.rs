//! In-memory category-set cache
//!
//! Local to one process. Use the SQLite cache when more than one process
//! writes category configuration.

use async_trait::async_trait;
use links_category_domain::{CategorySet, CategorySetCache};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Namespaced category-set cache held in process memory
pub struct InMemoryCategoryCache {
    namespace: String,
    entries: RwLock<HashMap<String, CategorySet>>,
}

impl InMemoryCategoryCache {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CategorySetCache for InMemoryCategoryCache {
    async fn get(&self, key: &str) -> Option<CategorySet> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn set(&self, key: &str, value: CategorySet) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    async fn delete(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        tracing::debug!(namespace = %self.namespace, key, "Cache entry deleted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(ids: &[i64]) -> CategorySet {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_get_set_delete() {
        let cache = InMemoryCategoryCache::new("allowed_links_category");
        assert!(cache.get("allowed").await.is_none());

        cache.set("allowed", set_of(&[1, 2])).await;
        assert_eq!(cache.get("allowed").await, Some(set_of(&[1, 2])));

        cache.set("allowed", set_of(&[3])).await;
        assert_eq!(cache.get("allowed").await, Some(set_of(&[3])));

        cache.delete("allowed").await;
        assert!(cache.get("allowed").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let cache = InMemoryCategoryCache::new("ns");
        cache.set("other", set_of(&[9])).await;
        cache.delete("allowed").await;
        assert_eq!(cache.get("other").await, Some(set_of(&[9])));
    }
}
