//! Category administration
//!
//! Every successful category write invalidates the policy cache.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    cache::CategoryPolicyCache,
    model::{Actor, Category, CategoryId, NewCategory},
    policy::INVALID_ACCESS_KEY,
    ports::{CategoryStore, StoreError},
};

/// Partial update of a category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub links_only: Option<bool>,
}

#[derive(Debug, Error)]
pub enum CategoryAdminError {
    #[error("Only staff can manage categories")]
    PermissionDenied,
    #[error("Category {0} not found")]
    NotFound(CategoryId),
    #[error("Category name can't be blank")]
    NameBlank,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CategoryAdminError {
    pub fn key(&self) -> &'static str {
        match self {
            CategoryAdminError::PermissionDenied => INVALID_ACCESS_KEY,
            CategoryAdminError::NotFound(_) => "not_found",
            CategoryAdminError::NameBlank => "category.name_blank",
            CategoryAdminError::Store(_) => "internal_error",
        }
    }
}

pub struct CategoryAdmin {
    policy: Arc<CategoryPolicyCache>,
    categories: Arc<dyn CategoryStore>,
}

impl CategoryAdmin {
    pub fn new(policy: Arc<CategoryPolicyCache>, categories: Arc<dyn CategoryStore>) -> Self {
        Self { policy, categories }
    }

    pub async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.categories.list_categories().await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        category: NewCategory,
    ) -> Result<Category, CategoryAdminError> {
        ensure_staff(actor)?;

        let name = category.name.trim();
        if name.is_empty() {
            return Err(CategoryAdminError::NameBlank);
        }

        let created = self
            .categories
            .create_category(&NewCategory {
                name: name.to_string(),
                links_only: category.links_only,
            })
            .await?;
        self.policy.invalidate().await;

        tracing::info!(
            category_id = created.id,
            name = %created.name,
            links_only = created.links_only,
            "Created category"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> Result<Category, CategoryAdminError> {
        ensure_staff(actor)?;

        let mut category = self
            .categories
            .get_category(id)
            .await?
            .ok_or(CategoryAdminError::NotFound(id))?;

        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CategoryAdminError::NameBlank);
            }
            category.name = name.to_string();
        }
        if let Some(links_only) = changes.links_only {
            category.links_only = links_only;
        }

        self.categories.save_category(&category).await?;
        self.policy.invalidate().await;

        tracing::info!(
            category_id = id,
            links_only = category.links_only,
            "Saved category"
        );
        Ok(category)
    }
}

fn ensure_staff(actor: &Actor) -> Result<(), CategoryAdminError> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(CategoryAdminError::PermissionDenied)
    }
}
