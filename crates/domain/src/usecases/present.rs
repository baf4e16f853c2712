//! Typed response views carrying the link-topic fields

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    cache::CategoryPolicyCache,
    link,
    model::{Actor, Category, CategoryId, LinksCategorySettings, Post, Topic, TopicId, UserId},
    policy,
    ports::{CategorySet, CategoryStore, StoreError, TopicStore, UserStore},
};

const SUGGESTED_LIMIT: usize = 5;

/// User action type for a created topic
pub const NEW_TOPIC_ACTION: u8 = 4;

/// Featured-link fields shared by every topic representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeaturedLinkFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_link_domain: Option<String>,
    #[serde(rename = "include_featured_link?")]
    pub include_featured_link: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub categories: Vec<Category>,
    /// Omitted while the feature is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_category_ids: Option<Vec<CategoryId>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub post_number: u32,
    pub user_id: UserId,
    pub raw: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            post_number: post.post_number,
            user_id: post.user_id,
            raw: post.raw,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedTopic {
    pub id: TopicId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    #[serde(flatten)]
    pub link: FeaturedLinkFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    pub id: TopicId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub user_id: UserId,
    pub archetype: String,
    pub closed: bool,
    pub visible: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub link: FeaturedLinkFields,
    pub posts: Vec<PostView>,
    pub suggested_topics: Vec<SuggestedTopic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicListItem {
    pub id: TopicId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub link: FeaturedLinkFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActionView {
    pub action_type: u8,
    pub topic_id: TopicId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub link: FeaturedLinkFields,
}

/// Builds response views for a viewer
pub struct Presenter {
    settings: LinksCategorySettings,
    policy: Arc<CategoryPolicyCache>,
    categories: Arc<dyn CategoryStore>,
    topics: Arc<dyn TopicStore>,
    users: Arc<dyn UserStore>,
}

impl Presenter {
    pub fn new(
        settings: LinksCategorySettings,
        policy: Arc<CategoryPolicyCache>,
        categories: Arc<dyn CategoryStore>,
        topics: Arc<dyn TopicStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            settings,
            policy,
            categories,
            topics,
            users,
        }
    }

    pub async fn site(&self) -> Result<SiteView, StoreError> {
        let categories = self.categories.list_categories().await?;
        let links_category_ids: Option<Vec<CategoryId>> = if self.settings.enabled {
            Some(self.policy.allowed_categories().await?.into_iter().collect())
        } else {
            None
        };
        Ok(SiteView {
            categories,
            links_category_ids,
        })
    }

    /// `None` when the topic is missing or hidden from the viewer
    pub async fn topic_view(
        &self,
        viewer: &Actor,
        topic_id: TopicId,
    ) -> Result<Option<TopicView>, StoreError> {
        let Some(topic) = self.topics.get_topic(topic_id).await? else {
            return Ok(None);
        };
        if !policy::can_see_topic(viewer, &topic) {
            return Ok(None);
        }

        let allowed = self.policy.allowed_categories().await?;
        let posts = self
            .topics
            .posts_for_topic(topic.id)
            .await?
            .into_iter()
            .map(PostView::from)
            .collect();
        let suggested_topics = self.suggested(viewer, &topic, &allowed).await?;
        let link = self.link_fields(viewer, &topic, &allowed);

        Ok(Some(TopicView {
            id: topic.id,
            title: topic.title,
            category_id: topic.category_id,
            user_id: topic.user_id,
            archetype: topic.archetype,
            closed: topic.closed,
            visible: topic.visible,
            created_at: topic.created_at,
            link,
            posts,
            suggested_topics,
        }))
    }

    pub async fn latest(&self, viewer: &Actor, limit: usize) -> Result<Vec<TopicListItem>, StoreError> {
        let allowed = self.policy.allowed_categories().await?;
        let topics = self.topics.latest_topics(limit).await?;
        Ok(topics
            .into_iter()
            .filter(|t| policy::can_see_topic(viewer, t))
            .map(|topic| TopicListItem {
                link: self.link_fields(viewer, &topic, &allowed),
                id: topic.id,
                title: topic.title,
                category_id: topic.category_id,
                user_id: topic.user_id,
                created_at: topic.created_at,
            })
            .collect())
    }

    /// `None` when the username is unknown
    pub async fn user_actions(
        &self,
        viewer: &Actor,
        username: &str,
    ) -> Result<Option<Vec<UserActionView>>, StoreError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(None);
        };
        let allowed = self.policy.allowed_categories().await?;
        let topics = self.topics.topics_by_user(user.id).await?;
        let actions = topics
            .into_iter()
            .filter(|t| policy::can_see_topic(viewer, t))
            .map(|topic| UserActionView {
                action_type: NEW_TOPIC_ACTION,
                link: self.link_fields(viewer, &topic, &allowed),
                topic_id: topic.id,
                title: topic.title,
                category_id: topic.category_id,
                username: user.username.clone(),
                created_at: topic.created_at,
            })
            .collect();
        Ok(Some(actions))
    }

    /// Digest email anchors for the latest visible link topics
    pub async fn digest_anchors(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        if !self.settings.enabled {
            return Ok(vec![]);
        }
        let allowed = self.policy.allowed_categories().await?;
        let topics = self.topics.visible_topics(None, limit).await?;
        Ok(topics
            .iter()
            .filter(|t| t.category_id.is_some_and(|c| allowed.contains(&c)))
            .filter_map(|t| digest_anchor(t, &self.settings.digest_email_anchor_style))
            .collect())
    }

    async fn suggested(
        &self,
        viewer: &Actor,
        topic: &Topic,
        allowed: &CategorySet,
    ) -> Result<Vec<SuggestedTopic>, StoreError> {
        // One extra row covers the topic itself
        let candidates = self
            .topics
            .visible_topics(topic.category_id, SUGGESTED_LIMIT + 1)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|t| t.id != topic.id)
            .take(SUGGESTED_LIMIT)
            .map(|t| SuggestedTopic {
                link: self.link_fields(viewer, &t, allowed),
                id: t.id,
                title: t.title,
                category_id: t.category_id,
            })
            .collect())
    }

    fn link_fields(&self, viewer: &Actor, topic: &Topic, allowed: &CategorySet) -> FeaturedLinkFields {
        let include = self.settings.enabled
            && topic.category_id.is_some_and(|c| allowed.contains(&c))
            && policy::can_see_topic(viewer, topic);
        if !include {
            return FeaturedLinkFields::default();
        }
        FeaturedLinkFields {
            featured_link_domain: topic.featured_link.as_deref().and_then(link::domain_of),
            featured_link: topic.featured_link.clone(),
            include_featured_link: true,
        }
    }
}

/// Anchor for a link topic in digest emails
pub fn digest_anchor(topic: &Topic, style: &str) -> Option<String> {
    let link = topic.featured_link.as_deref()?;
    let label = link::domain_of(link).unwrap_or_else(|| link.to_string());
    Some(format!(
        r#"<a href="{}" style="{}">{}</a>"#,
        escape_html(link),
        escape_html(style),
        escape_html(&label)
    ))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::REGULAR_ARCHETYPE;
    use crate::testing::{FakeForum, policy_for, test_user, user_actor};
    use time::Duration;

    fn topic(id: TopicId, category_id: CategoryId, link: Option<&str>) -> Topic {
        Topic {
            id,
            title: format!("Topic {id}"),
            category_id: Some(category_id),
            user_id: 10,
            featured_link: link.map(str::to_string),
            archetype: REGULAR_ARCHETYPE.to_string(),
            closed: false,
            visible: true,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(id),
        }
    }

    fn presenter(forum: &Arc<FakeForum>, settings: LinksCategorySettings) -> Presenter {
        Presenter::new(
            settings,
            policy_for(forum),
            forum.clone(),
            forum.clone(),
            forum.clone(),
        )
    }

    fn seeded() -> Arc<FakeForum> {
        let forum = FakeForum::with_categories(&[(1, true), (2, false)]);
        forum.add_user(test_user(10, false));
        forum.add_topic(topic(1, 1, Some("https://www.example.com/story")));
        forum.add_topic(topic(2, 1, Some("http://news.example.org/")));
        forum.add_topic(topic(3, 2, None));
        forum
    }

    #[tokio::test]
    async fn test_site_lists_link_categories() {
        let forum = seeded();
        let site = presenter(&forum, LinksCategorySettings::default())
            .site()
            .await
            .unwrap();

        assert_eq!(site.links_category_ids, Some(vec![1]));
        assert_eq!(site.categories.len(), 2);
    }

    #[tokio::test]
    async fn test_site_omits_ids_when_disabled() {
        let forum = seeded();
        let settings = LinksCategorySettings {
            enabled: false,
            ..Default::default()
        };
        let site = presenter(&forum, settings).site().await.unwrap();

        let json = serde_json::to_value(&site).unwrap();
        assert!(json.get("links_category_ids").is_none());
    }

    #[tokio::test]
    async fn test_topic_view_includes_featured_link() {
        let forum = seeded();
        let view = presenter(&forum, LinksCategorySettings::default())
            .topic_view(&Actor::Anonymous, 1)
            .await
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["featured_link"], "https://www.example.com/story");
        assert_eq!(json["featured_link_domain"], "example.com");
        assert_eq!(json["include_featured_link?"], true);
        assert_eq!(json["suggested_topics"][0]["id"], 2);
        assert_eq!(json["suggested_topics"][0]["include_featured_link?"], true);
    }

    #[tokio::test]
    async fn test_suggested_skips_hidden_topics() {
        let forum = FakeForum::with_categories(&[(1, true)]);
        for id in 1..=10 {
            let mut t = topic(id, 1, Some("http://example.com/"));
            t.visible = id <= 5;
            forum.add_topic(t);
        }

        let view = presenter(&forum, LinksCategorySettings::default())
            .topic_view(&Actor::Anonymous, 1)
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<_> = view.suggested_topics.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn test_suggested_caps_at_five() {
        let forum = FakeForum::with_categories(&[(1, true)]);
        for id in 1..=8 {
            forum.add_topic(topic(id, 1, None));
        }

        let view = presenter(&forum, LinksCategorySettings::default())
            .topic_view(&Actor::Anonymous, 8)
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<_> = view.suggested_topics.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn test_regular_topic_excludes_featured_link() {
        let forum = seeded();
        let view = presenter(&forum, LinksCategorySettings::default())
            .topic_view(&Actor::Anonymous, 3)
            .await
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("featured_link").is_none());
        assert_eq!(json["include_featured_link?"], false);
    }

    #[tokio::test]
    async fn test_hidden_topic_not_shown_to_others() {
        let forum = FakeForum::with_categories(&[(1, true)]);
        let mut hidden = topic(1, 1, Some("http://example.com/"));
        hidden.visible = false;
        forum.add_topic(hidden);
        let presenter = presenter(&forum, LinksCategorySettings::default());

        assert!(
            presenter
                .topic_view(&user_actor(11, false), 1)
                .await
                .unwrap()
                .is_none()
        );
        let own = presenter
            .topic_view(&user_actor(10, false), 1)
            .await
            .unwrap()
            .unwrap();
        assert!(own.link.include_featured_link);
    }

    #[tokio::test]
    async fn test_latest_newest_first() {
        let forum = seeded();
        let items = presenter(&forum, LinksCategorySettings::default())
            .latest(&Actor::Anonymous, 10)
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(!items[0].link.include_featured_link);
        assert_eq!(items[1].link.featured_link_domain.as_deref(), Some("news.example.org"));
    }

    #[tokio::test]
    async fn test_user_actions() {
        let forum = seeded();
        let presenter = presenter(&forum, LinksCategorySettings::default());

        let actions = presenter
            .user_actions(&Actor::Anonymous, "user10")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(actions.len(), 3);
        assert!(actions.iter().all(|a| a.action_type == NEW_TOPIC_ACTION));

        assert!(
            presenter
                .user_actions(&Actor::Anonymous, "nobody")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_digest_anchors_use_style() {
        let forum = seeded();
        let settings = LinksCategorySettings {
            digest_email_anchor_style: "color: red;".to_string(),
            ..Default::default()
        };
        let anchors = presenter(&forum, settings).digest_anchors(10).await.unwrap();

        assert_eq!(anchors.len(), 2);
        assert_eq!(
            anchors[1],
            r#"<a href="https://www.example.com/story" style="color: red;">example.com</a>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a"<b>&'"#), "a&quot;&lt;b&gt;&amp;&#39;");
    }
}
