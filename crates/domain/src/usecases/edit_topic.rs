//! Topic edit use case
//!
//! Each tracked field is applied on its own: a rejected category move or
//! featured link does not stop the other fields from being saved.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cache::CategoryPolicyCache,
    model::{Actor, CategoryId, LinksCategorySettings, Topic, TopicId},
    policy::{self, INVALID_ACCESS_KEY},
    ports::{CategoryStore, StoreError, TopicStore},
    usecases::create_link::TITLE_BLANK_KEY,
};

pub const CATEGORY_NOT_FOUND_KEY: &str = "category.not_found";

/// Tracked fields a topic edit may change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicChanges {
    pub title: Option<String>,
    pub category_id: Option<CategoryId>,
    pub featured_link: Option<String>,
}

/// A rejected field change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TopicEditOutcome {
    pub topic: Topic,
    pub errors: Vec<FieldError>,
}

impl TopicEditOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum EditTopicError {
    #[error("Topic {0} not found")]
    NotFound(TopicId),
    #[error("You are not permitted to edit this topic")]
    PermissionDenied,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EditTopicError {
    pub fn key(&self) -> &'static str {
        match self {
            EditTopicError::NotFound(_) => "not_found",
            EditTopicError::PermissionDenied => INVALID_ACCESS_KEY,
            EditTopicError::Store(_) => "internal_error",
        }
    }
}

/// Use case for editing tracked topic fields
pub struct TopicEditor {
    settings: LinksCategorySettings,
    policy: Arc<CategoryPolicyCache>,
    categories: Arc<dyn CategoryStore>,
    topics: Arc<dyn TopicStore>,
}

impl TopicEditor {
    pub fn new(
        settings: LinksCategorySettings,
        policy: Arc<CategoryPolicyCache>,
        categories: Arc<dyn CategoryStore>,
        topics: Arc<dyn TopicStore>,
    ) -> Self {
        Self {
            settings,
            policy,
            categories,
            topics,
        }
    }

    pub async fn update(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        changes: TopicChanges,
    ) -> Result<TopicEditOutcome, EditTopicError> {
        let mut topic = self
            .topics
            .get_topic(topic_id)
            .await?
            .ok_or(EditTopicError::NotFound(topic_id))?;

        if !policy::can_edit_topic(actor, &topic) {
            return Err(EditTopicError::PermissionDenied);
        }

        let mut errors = Vec::new();
        let mut changed = false;

        if let Some(title) = changes.title {
            let title = title.trim();
            if title.is_empty() {
                errors.push(FieldError {
                    field: "title",
                    key: TITLE_BLANK_KEY,
                    message: "Title can't be blank".to_string(),
                });
            } else if title != topic.title {
                topic.title = title.to_string();
                changed = true;
            }
        }

        if let Some(new_category) = changes.category_id {
            if topic.category_id != Some(new_category) {
                match self.move_category(actor, &topic, new_category).await? {
                    Ok(()) => {
                        tracing::info!(
                            topic_id,
                            from = ?topic.category_id,
                            to = new_category,
                            "Topic category changed"
                        );
                        topic.category_id = Some(new_category);
                        changed = true;
                    }
                    Err(error) => errors.push(error),
                }
            }
        }

        if let Some(link) = changes.featured_link {
            let is_link_category = self.policy.is_link_category_opt(topic.category_id).await?;
            match policy::guard_featured_link(&link, is_link_category, self.settings.enabled) {
                Ok(value) => {
                    let value = (!value.is_empty()).then_some(value);
                    if value != topic.featured_link {
                        topic.featured_link = value;
                        changed = true;
                    }
                }
                Err(e) => {
                    tracing::warn!(topic_id, link = %e.input, "Rejected featured link edit");
                    errors.push(FieldError {
                        field: "featured_link",
                        key: e.key(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if changed {
            self.topics.update_topic(&topic).await?;
        }

        Ok(TopicEditOutcome { topic, errors })
    }

    /// Inner result is the field outcome; outer is a store fault
    async fn move_category(
        &self,
        actor: &Actor,
        topic: &Topic,
        new_category: CategoryId,
    ) -> Result<Result<(), FieldError>, StoreError> {
        if self.categories.get_category(new_category).await?.is_none() {
            return Ok(Err(FieldError {
                field: "category_id",
                key: CATEGORY_NOT_FOUND_KEY,
                message: format!("Category {new_category} does not exist"),
            }));
        }

        let old_is_link = self.policy.is_link_category_opt(topic.category_id).await?;
        let new_is_link = self.policy.is_link_category(new_category).await?;

        Ok(
            policy::check_category_move(old_is_link, new_is_link, actor.is_staff()).map_err(
                |e| {
                    tracing::warn!(
                        topic_id = topic.id,
                        from = ?topic.category_id,
                        to = new_category,
                        reason = e.key(),
                        "Category move rejected"
                    );
                    FieldError {
                        field: "category_id",
                        key: e.key(),
                        message: e.to_string(),
                    }
                },
            ),
        )
    }
}
