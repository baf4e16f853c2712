//! Fake port implementations shared by the use case tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::cache::CategoryPolicyCache;
use crate::model::{
    Actor, Category, CategoryId, NewCategory, NewLinkTopic, NewUser, Post, Topic, TopicId, User,
    UserId,
};
use crate::ports::{CategorySet, CategorySetCache, CategoryStore, Clock, StoreError, TopicStore, UserStore};

#[derive(Default)]
pub struct FakeForum {
    categories: Mutex<Vec<Category>>,
    users: Mutex<Vec<User>>,
    topics: Mutex<Vec<Topic>>,
    posts: Mutex<Vec<Post>>,
}

impl FakeForum {
    pub fn with_categories(categories: &[(CategoryId, bool)]) -> Arc<Self> {
        let forum = Self::default();
        {
            let mut stored = forum.categories.lock().unwrap();
            for &(id, links_only) in categories {
                stored.push(Category {
                    id,
                    name: format!("category-{id}"),
                    links_only,
                });
            }
        }
        Arc::new(forum)
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_topic(&self, topic: Topic) {
        self.topics.lock().unwrap().push(topic);
    }

    pub fn topic_count(&self) -> usize {
        self.topics.lock().unwrap().len()
    }

    pub fn stored_topic(&self, id: TopicId) -> Option<Topic> {
        self.topics
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Flip a category's policy behind the cache's back
    pub fn set_links_only(&self, id: CategoryId, links_only: bool) {
        for category in self.categories.lock().unwrap().iter_mut() {
            if category.id == id {
                category.links_only = links_only;
            }
        }
    }
}

fn newest_first(mut topics: Vec<Topic>) -> Vec<Topic> {
    topics.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    topics
}

#[async_trait]
impl CategoryStore for FakeForum {
    async fn link_category_ids(&self) -> Result<Vec<CategoryId>, StoreError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.links_only)
            .map(|c| c.id)
            .collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StoreError> {
        let mut categories = self.categories.lock().unwrap();
        let id = categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Category {
            id,
            name: category.name.clone(),
            links_only: category.links_only,
        };
        categories.push(created.clone());
        Ok(created)
    }

    async fn save_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = self.categories.lock().unwrap();
        let stored = categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| StoreError::NotFound(format!("category {}", category.id)))?;
        *stored = category.clone();
        Ok(())
    }
}

#[async_trait]
impl UserStore for FakeForum {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        let created = User {
            id: users.len() as UserId + 1,
            username: user.username.clone(),
            admin: user.admin,
            moderator: user.moderator,
        };
        users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TopicStore for FakeForum {
    async fn create_link_topic(&self, topic: &NewLinkTopic) -> Result<(Topic, Post), StoreError> {
        let mut topics = self.topics.lock().unwrap();
        let mut posts = self.posts.lock().unwrap();
        let created = Topic {
            id: topics.len() as TopicId + 1,
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
            id: posts.len() as i64 + 1,
            topic_id: created.id,
            post_number: 1,
            user_id: topic.user_id,
            raw: topic.raw.clone(),
            tracking: topic.tracking.clone(),
            metadata: topic.metadata.clone(),
            created_at: topic.created_at,
        };
        topics.push(created.clone());
        posts.push(post.clone());
        Ok((created, post))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError> {
        Ok(self.stored_topic(id))
    }

    async fn update_topic(&self, topic: &Topic) -> Result<(), StoreError> {
        let mut topics = self.topics.lock().unwrap();
        let stored = topics
            .iter_mut()
            .find(|t| t.id == topic.id)
            .ok_or_else(|| StoreError::NotFound(format!("topic {}", topic.id)))?;
        *stored = topic.clone();
        Ok(())
    }

    async fn posts_for_topic(&self, id: TopicId) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.topic_id == id)
            .cloned()
            .collect())
    }

    async fn latest_topics(&self, limit: usize) -> Result<Vec<Topic>, StoreError> {
        let mut topics = newest_first(self.topics.lock().unwrap().clone());
        topics.truncate(limit);
        Ok(topics)
    }

    async fn visible_topics(
        &self,
        category_id: Option<CategoryId>,
        limit: usize,
    ) -> Result<Vec<Topic>, StoreError> {
        let in_category = self
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.visible && category_id.is_none_or(|c| t.category_id == Some(c)))
            .cloned()
            .collect();
        let mut topics = newest_first(in_category);
        topics.truncate(limit);
        Ok(topics)
    }

    async fn topics_by_user(&self, user_id: UserId) -> Result<Vec<Topic>, StoreError> {
        let owned = self
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }
}

#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, CategorySet>>,
}

#[async_trait]
impl CategorySetCache for FakeCache {
    async fn get(&self, key: &str) -> Option<CategorySet> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: CategorySet) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(OffsetDateTime::UNIX_EPOCH))
}

pub fn policy_for(forum: &Arc<FakeForum>) -> Arc<CategoryPolicyCache> {
    Arc::new(CategoryPolicyCache::new(
        Arc::new(FakeCache::default()),
        forum.clone(),
    ))
}

pub fn test_user(id: UserId, staff: bool) -> User {
    User {
        id,
        username: format!("user{id}"),
        admin: false,
        moderator: staff,
    }
}

pub fn user_actor(id: UserId, staff: bool) -> Actor {
    Actor::User(test_user(id, staff))
}
