//! SQLite category-set cache
//!
//! Entries live in the `cache_entries` table of the forum database, so a
//! delete issued by one process (the CLI) is seen by every other process
//! that opened the same file (a running server) on its next read.
//!
//! The cache port is infallible: database errors are logged and read as a
//! miss, which sends the caller back to the category store.

use async_trait::async_trait;
use links_category_domain::{CategorySet, CategorySetCache};
use sqlx::SqlitePool;

/// Namespaced category-set cache stored next to the forum data
pub struct SqliteCategoryCache {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteCategoryCache {
    pub(crate) fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<CategorySet>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM cache_entries WHERE namespace = ? AND key = ?")
                .bind(&self.namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((value,)) = row else {
            return Ok(None);
        };

        match serde_json::from_str(&value) {
            Ok(set) => Ok(Some(set)),
            Err(e) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    key,
                    error = %e,
                    "Discarding unreadable cache entry"
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CategorySetCache for SqliteCategoryCache {
    async fn get(&self, key: &str) -> Option<CategorySet> {
        match self.read(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: CategorySet) {
        let encoded = match serde_json::to_string(&value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, key, error = %e, "Cache encode failed");
                return;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO cache_entries (namespace, key, value)
            VALUES (?, ?, ?)
            ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(&encoded)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(namespace = %self.namespace, key, error = %e, "Cache write failed");
        }
    }

    async fn delete(&self, key: &str) {
        let result = sqlx::query("DELETE FROM cache_entries WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => tracing::debug!(namespace = %self.namespace, key, "Cache entry deleted"),
            // A surviving entry would go stale, so this one is louder
            Err(e) => tracing::error!(
                namespace = %self.namespace,
                key,
                error = %e,
                "Cache delete failed"
            ),
        }
    }
}
