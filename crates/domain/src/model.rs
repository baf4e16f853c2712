//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type CategoryId = i64;
pub type TopicId = i64;
pub type PostId = i64;
pub type UserId = i64;

/// Name of the category custom field that marks a category as link-only
pub const LINKS_CATEGORY_FIELD: &str = "enable_links_category";

/// Feature settings (site-wide)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksCategorySettings {
    /// Gates the whole feature
    pub enabled: bool,
    /// Put the link text in the post body so the host can build a preview
    pub show_onebox_in_post: bool,
    /// CSS applied to the link anchor in digest emails
    pub digest_email_anchor_style: String,
}

impl Default for LinksCategorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_onebox_in_post: true,
            digest_email_anchor_style: "color: #0088cc; text-decoration: none;".to_string(),
        }
    }
}

/// A discussion category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Only link topics may be posted here
    pub links_only: bool,
}

/// Input for creating a category
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub links_only: bool,
}

/// A forum user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub admin: bool,
    pub moderator: bool,
}

impl User {
    pub const SYSTEM_ID: UserId = -1;

    /// Built-in admin used by command-line maintenance
    pub fn system() -> Self {
        Self {
            id: Self::SYSTEM_ID,
            username: "system".to_string(),
            admin: true,
            moderator: true,
        }
    }

    /// Staff members are privileged actors
    pub fn is_staff(&self) -> bool {
        self.admin || self.moderator
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub admin: bool,
    pub moderator: bool,
}

/// Whoever is performing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(User),
}

impl Actor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Actor::User(user) => Some(user),
            Actor::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.user().is_some_and(User::is_staff)
    }

    pub fn id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }
}

/// A topic (thread)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub user_id: UserId,
    /// Normalized absolute URL for link topics
    pub featured_link: Option<String>,
    pub archetype: String,
    pub closed: bool,
    pub visible: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Topic-tracking fields submitted with a new post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub archetype: Option<String>,
    pub auto_track: Option<bool>,
    pub typing_duration_msecs: Option<u64>,
    pub composer_open_duration_msecs: Option<u64>,
}

/// Request metadata kept for abuse-prevention collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// A post inside a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub topic_id: TopicId,
    pub post_number: u32,
    pub user_id: UserId,
    pub raw: String,
    pub tracking: TrackingInfo,
    pub metadata: RequestMetadata,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Everything needed to persist a link topic and its first post
#[derive(Debug, Clone)]
pub struct NewLinkTopic {
    pub title: String,
    pub category_id: CategoryId,
    pub user_id: UserId,
    pub featured_link: String,
    pub raw: String,
    pub archetype: String,
    pub tracking: TrackingInfo,
    pub metadata: RequestMetadata,
    pub created_at: OffsetDateTime,
}

pub const REGULAR_ARCHETYPE: &str = "regular";
