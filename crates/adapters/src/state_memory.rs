//! In-memory forum store for testing and offline mode

use async_trait::async_trait;
use links_category_domain::{
    Category, CategoryId, CategoryStore, NewCategory, NewLinkTopic, NewUser, Post, StoreError,
    Topic, TopicId, TopicStore, User, UserId, UserStore,
};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct ForumData {
    categories: BTreeMap<CategoryId, Category>,
    users: BTreeMap<UserId, User>,
    topics: BTreeMap<TopicId, Topic>,
    posts: Vec<Post>,
}

/// In-memory implementation of the category, user and topic stores
pub struct InMemoryForumStore {
    data: RwLock<ForumData>,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(ForumData::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, ForumData>, StoreError> {
        self.data
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, ForumData>, StoreError> {
        self.data
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Default for InMemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id<V>(map: &BTreeMap<i64, V>) -> i64 {
    map.keys().next_back().copied().unwrap_or(0) + 1
}

#[async_trait]
impl CategoryStore for InMemoryForumStore {
    async fn link_category_ids(&self) -> Result<Vec<CategoryId>, StoreError> {
        let data = self.read()?;
        Ok(data
            .categories
            .values()
            .filter(|c| c.links_only)
            .map(|c| c.id)
            .collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StoreError> {
        let mut data = self.write()?;
        let created = Category {
            id: next_id(&data.categories),
            name: category.name.clone(),
            links_only: category.links_only,
        };
        data.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut data = self.write()?;
        let stored = data
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| StoreError::NotFound(format!("category {}", category.id)))?;
        *stored = category.clone();
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryForumStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut data = self.write()?;
        if data
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(StoreError::Conflict(format!(
                "username {} is taken",
                user.username
            )));
        }
        let created = User {
            id: next_id(&data.users),
            username: user.username.clone(),
            admin: user.admin,
            moderator: user.moderator,
        };
        data.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TopicStore for InMemoryForumStore {
    async fn create_link_topic(&self, topic: &NewLinkTopic) -> Result<(Topic, Post), StoreError> {
        let mut data = self.write()?;
        let created = Topic {
            id: next_id(&data.topics),
            title: topic.title.clone(),
            category_id: Some(topic.category_id),
            user_id: topic.user_id,
            featured_link: Some(topic.featured_link.clone()),
            archetype: topic.archetype.clone(),
            closed: false,
            visible: true,
            created_at: topic.created_at,
        };
        let post = Post {
            id: data.posts.len() as i64 + 1,
            topic_id: created.id,
            post_number: 1,
            user_id: topic.user_id,
            raw: topic.raw.clone(),
            tracking: topic.tracking.clone(),
            metadata: topic.metadata.clone(),
            created_at: topic.created_at,
        };
        data.topics.insert(created.id, created.clone());
        data.posts.push(post.clone());
        Ok((created, post))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError> {
        Ok(self.read()?.topics.get(&id).cloned())
    }

    async fn update_topic(&self, topic: &Topic) -> Result<(), StoreError> {
        let mut data = self.write()?;
        let stored = data
            .topics
            .get_mut(&topic.id)
            .ok_or_else(|| StoreError::NotFound(format!("topic {}", topic.id)))?;
        *stored = topic.clone();
        Ok(())
    }

    async fn posts_for_topic(&self, id: TopicId) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .read()?
            .posts
            .iter()
            .filter(|p| p.topic_id == id)
            .cloned()
            .collect())
    }

    /// Ids grow with creation, so reverse id order is newest first
    async fn latest_topics(&self, limit: usize) -> Result<Vec<Topic>, StoreError> {
        let data = self.read()?;
        Ok(data
            .topics
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn visible_topics(
        &self,
        category_id: Option<CategoryId>,
        limit: usize,
    ) -> Result<Vec<Topic>, StoreError> {
        let data = self.read()?;
        Ok(data
            .topics
            .values()
            .rev()
            .filter(|t| t.visible && category_id.is_none_or(|c| t.category_id == Some(c)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn topics_by_user(&self, user_id: UserId) -> Result<Vec<Topic>, StoreError> {
        let data = self.read()?;
        Ok(data
            .topics
            .values()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use links_category_domain::{REGULAR_ARCHETYPE, RequestMetadata, TrackingInfo};
    use time::OffsetDateTime;

    fn new_topic(category_id: CategoryId, title: &str) -> NewLinkTopic {
        NewLinkTopic {
            title: title.to_string(),
            category_id,
            user_id: 1,
            featured_link: "http://example.com/".to_string(),
            raw: String::new(),
            archetype: REGULAR_ARCHETYPE.to_string(),
            tracking: TrackingInfo::default(),
            metadata: RequestMetadata::default(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_link_category_ids_follow_saves() {
        let store = InMemoryForumStore::new();
        let mut links = store
            .create_category(&NewCategory {
                name: "Links".to_string(),
                links_only: true,
            })
            .await
            .unwrap();
        store
            .create_category(&NewCategory {
                name: "General".to_string(),
                links_only: false,
            })
            .await
            .unwrap();

        assert_eq!(store.link_category_ids().await.unwrap(), vec![links.id]);

        links.links_only = false;
        store.save_category(&links).await.unwrap();
        assert!(store.link_category_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = InMemoryForumStore::new();
        let user = NewUser {
            username: "alice".to_string(),
            ..Default::default()
        };
        store.create_user(&user).await.unwrap();

        let result = store.create_user(&user).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.find_by_username("ALICE").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_topics_listed_newest_first() {
        let store = InMemoryForumStore::new();
        store.create_link_topic(&new_topic(1, "first")).await.unwrap();
        store.create_link_topic(&new_topic(2, "second")).await.unwrap();
        store.create_link_topic(&new_topic(1, "third")).await.unwrap();

        let latest: Vec<_> = store
            .latest_topics(2)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(latest, vec!["third", "second"]);

        let in_category = store.visible_topics(Some(1), 10).await.unwrap();
        assert_eq!(in_category.len(), 2);
        assert_eq!(in_category[0].title, "third");
    }

    #[tokio::test]
    async fn test_visible_topics_skip_hidden_before_limit() {
        let store = InMemoryForumStore::new();
        let (mut hidden, _) = store.create_link_topic(&new_topic(1, "hidden")).await.unwrap();
        store.create_link_topic(&new_topic(1, "shown")).await.unwrap();
        let (mut newest, _) = store.create_link_topic(&new_topic(2, "newest")).await.unwrap();
        hidden.visible = false;
        newest.visible = false;
        store.update_topic(&hidden).await.unwrap();
        store.update_topic(&newest).await.unwrap();

        let all = store.visible_topics(None, 1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "shown");
        assert_eq!(store.latest_topics(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_link_topic_stores_first_post() {
        let store = InMemoryForumStore::new();
        let (topic, post) = store.create_link_topic(&new_topic(1, "hello")).await.unwrap();

        assert_eq!(post.topic_id, topic.id);
        assert_eq!(post.post_number, 1);
        assert_eq!(store.posts_for_topic(topic.id).await.unwrap().len(), 1);
    }
}
