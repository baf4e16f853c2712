//! Link topic creation use case

use std::sync::Arc;

use thiserror::Error;

use crate::{
    cache::CategoryPolicyCache,
    link::{self, INVALID_LINK_KEY, InvalidLinkError},
    model::{
        Actor, CategoryId, LinksCategorySettings, NewLinkTopic, Post, REGULAR_ARCHETYPE,
        RequestMetadata, Topic, TrackingInfo,
    },
    policy::{self, INVALID_ACCESS_KEY},
    ports::{Clock, StoreError, TopicStore},
};

pub const TITLE_BLANK_KEY: &str = "topic.title_blank";

/// A request to create a link topic
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    pub featured_link: String,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub raw: Option<String>,
    pub tracking: TrackingInfo,
    pub metadata: RequestMetadata,
}

/// Error type for link topic creation
#[derive(Debug, Error)]
pub enum CreateLinkError {
    #[error("Links category is disabled")]
    Disabled,
    #[error("You are not permitted to post a link topic here")]
    PermissionDenied,
    #[error(transparent)]
    InvalidLink(#[from] InvalidLinkError),
    #[error("Title can't be blank")]
    TitleBlank,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CreateLinkError {
    /// Message key for user-facing errors
    pub fn key(&self) -> &'static str {
        match self {
            CreateLinkError::Disabled => "not_found",
            CreateLinkError::PermissionDenied => INVALID_ACCESS_KEY,
            CreateLinkError::InvalidLink(_) => INVALID_LINK_KEY,
            CreateLinkError::TitleBlank => TITLE_BLANK_KEY,
            CreateLinkError::Store(_) => "internal_error",
        }
    }
}

/// A freshly created link topic with its first post
#[derive(Debug, Clone)]
pub struct CreatedLinkTopic {
    pub topic: Topic,
    pub post: Post,
}

/// Use case for creating link topics
pub struct CreateLinkTopic {
    settings: LinksCategorySettings,
    policy: Arc<CategoryPolicyCache>,
    topics: Arc<dyn TopicStore>,
    clock: Arc<dyn Clock>,
}

impl CreateLinkTopic {
    pub fn new(
        settings: LinksCategorySettings,
        policy: Arc<CategoryPolicyCache>,
        topics: Arc<dyn TopicStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            policy,
            topics,
            clock,
        }
    }

    /// Normalize the link, check the category policy, then persist
    pub async fn execute(
        &self,
        actor: &Actor,
        request: CreateLinkRequest,
    ) -> Result<CreatedLinkTopic, CreateLinkError> {
        if !self.settings.enabled {
            return Err(CreateLinkError::Disabled);
        }

        let user = actor.user().ok_or(CreateLinkError::PermissionDenied)?;

        let featured_link = link::normalize(&request.featured_link)
            .map_err(|e| {
                tracing::warn!(user = %user.username, link = %e.input, "Rejected invalid link");
                e
            })?
            .into_string();

        let category_id = request
            .category_id
            .ok_or(CreateLinkError::PermissionDenied)?;
        let is_link_category = self.policy.is_link_category(category_id).await?;

        let now = self.clock.now();
        let archetype = request
            .tracking
            .archetype
            .clone()
            .unwrap_or_else(|| REGULAR_ARCHETYPE.to_string());

        let draft = Topic {
            id: 0,
            title: request.title.trim().to_string(),
            category_id: Some(category_id),
            user_id: user.id,
            featured_link: Some(featured_link.clone()),
            archetype: archetype.clone(),
            closed: false,
            visible: true,
            created_at: now,
        };

        if !policy::can_create_link_topic(actor, &draft, is_link_category) {
            tracing::warn!(
                user = %user.username,
                category_id,
                is_link_category,
                "Link topic creation denied"
            );
            return Err(CreateLinkError::PermissionDenied);
        }

        if draft.title.is_empty() {
            return Err(CreateLinkError::TitleBlank);
        }

        let raw = if self.settings.show_onebox_in_post {
            featured_link.clone()
        } else {
            request.raw.unwrap_or_default()
        };

        let new_topic = NewLinkTopic {
            title: draft.title,
            category_id,
            user_id: user.id,
            featured_link,
            raw,
            archetype,
            tracking: request.tracking,
            metadata: request.metadata,
            created_at: now,
        };

        let (topic, post) = self.topics.create_link_topic(&new_topic).await?;

        tracing::info!(
            topic_id = topic.id,
            post_id = post.id,
            category_id,
            user = %user.username,
            featured_link = ?topic.featured_link,
            "Created link topic"
        );

        Ok(CreatedLinkTopic { topic, post })
    }
}
