//! SQLite forum store implementation
//!
//! The link policy lives in `category_custom_fields` under
//! [`LINKS_CATEGORY_FIELD`], the same way the host forum stores it.

use async_trait::async_trait;
use links_category_domain::{
    Category, CategoryId, CategoryStore, LINKS_CATEGORY_FIELD, NewCategory, NewLinkTopic, NewUser,
    Post, RequestMetadata, StoreError, Topic, TopicId, TopicStore, TrackingInfo, User, UserId,
    UserStore,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::cache_sqlite::SqliteCategoryCache;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

type TopicRow = (
    i64,
    String,
    Option<i64>,
    i64,
    Option<String>,
    String,
    bool,
    bool,
    String,
);

type PostRow = (
    i64,
    i64,
    i64,
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

const TOPIC_COLUMNS: &str =
    "id, title, category_id, user_id, featured_link, archetype, closed, visible, created_at";

/// SQLite-backed forum store
pub struct SqliteForumStore {
    pool: SqlitePool,
}

impl SqliteForumStore {
    /// Create a new SQLite store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Category-set cache kept in this database, shared by every process
    /// that opens the same file
    pub fn category_cache(&self, namespace: impl Into<String>) -> SqliteCategoryCache {
        SqliteCategoryCache::new(self.pool.clone(), namespace)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS category_custom_fields (
                category_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                value TEXT,
                PRIMARY KEY(category_id, name)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                admin INTEGER NOT NULL DEFAULT 0,
                moderator INTEGER NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                category_id INTEGER,
                user_id INTEGER NOT NULL,
                featured_link TEXT,
                archetype TEXT NOT NULL,
                closed INTEGER NOT NULL DEFAULT 0,
                visible INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                post_number INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                raw TEXT NOT NULL,
                tracking TEXT NOT NULL,
                ip_address TEXT,
                user_agent TEXT,
                referrer TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(topic_id, post_number)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY(namespace, key)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_topics_category
            ON topics(category_id)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_topics_user
            ON topics(user_id)
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }

        Ok(())
    }

    async fn query_topics(
        &self,
        filter: &str,
        bind: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Topic>, StoreError> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics {filter} ORDER BY id DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, TopicRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(topic_from_row).collect()
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn format_time(value: OffsetDateTime) -> Result<String, StoreError> {
    value
        .format(&Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_time(value: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn topic_from_row(row: TopicRow) -> Result<Topic, StoreError> {
    let (id, title, category_id, user_id, featured_link, archetype, closed, visible, created_at) =
        row;
    Ok(Topic {
        id,
        title,
        category_id,
        user_id,
        featured_link,
        archetype,
        closed,
        visible,
        created_at: parse_time(&created_at)?,
    })
}

fn post_from_row(row: PostRow) -> Result<Post, StoreError> {
    let (
        id,
        topic_id,
        post_number,
        user_id,
        raw,
        tracking,
        ip_address,
        user_agent,
        referrer,
        created_at,
    ) = row;

    let tracking: TrackingInfo =
        serde_json::from_str(&tracking).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let post_number =
        u32::try_from(post_number).map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(Post {
        id,
        topic_id,
        post_number,
        user_id,
        raw,
        tracking,
        metadata: RequestMetadata {
            ip_address,
            user_agent,
            referrer,
        },
        created_at: parse_time(&created_at)?,
    })
}

#[async_trait]
impl CategoryStore for SqliteForumStore {
    async fn link_category_ids(&self) -> Result<Vec<CategoryId>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT category_id FROM category_custom_fields WHERE name = ? AND value = 'true' ORDER BY category_id",
        )
        .bind(LINKS_CATEGORY_FIELD)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, COALESCE(f.value = 'true', 0)
            FROM categories c
            LEFT JOIN category_custom_fields f
                ON f.category_id = c.id AND f.name = ?
            WHERE c.id = ?
            "#,
        )
        .bind(LINKS_CATEGORY_FIELD)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(|(id, name, links_only)| Category {
            id,
            name,
            links_only,
        }))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows: Vec<(i64, String, bool)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, COALESCE(f.value = 'true', 0)
            FROM categories c
            LEFT JOIN category_custom_fields f
                ON f.category_id = c.id AND f.name = ?
            ORDER BY c.id
            "#,
        )
        .bind(LINKS_CATEGORY_FIELD)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, links_only)| Category {
                id,
                name,
                links_only,
            })
            .collect())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let id = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(&category.name)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .last_insert_rowid();

        sqlx::query("INSERT INTO category_custom_fields (category_id, name, value) VALUES (?, ?, ?)")
            .bind(id)
            .bind(LINKS_CATEGORY_FIELD)
            .bind(category.links_only.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(Category {
            id,
            name: category.name.clone(),
            links_only: category.links_only,
        })
    }

    async fn save_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
            .bind(&category.name)
            .bind(category.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(format!("category {}", category.id)));
        }

        sqlx::query(
            r#"
            INSERT INTO category_custom_fields (category_id, name, value)
            VALUES (?, ?, ?)
            ON CONFLICT(category_id, name) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(category.id)
        .bind(LINKS_CATEGORY_FIELD)
        .bind(category.links_only.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteForumStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<(i64, String, bool, bool)> =
            sqlx::query_as("SELECT id, username, admin, moderator FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(|(id, username, admin, moderator)| User {
            id,
            username,
            admin,
            moderator,
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let result = sqlx::query("INSERT INTO users (username, admin, moderator) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(user.admin)
            .bind(user.moderator)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("username {} is taken", user.username))
                }
                _ => db_error(e),
            })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username.clone(),
            admin: user.admin,
            moderator: user.moderator,
        })
    }
}

#[async_trait]
impl TopicStore for SqliteForumStore {
    async fn create_link_topic(&self, topic: &NewLinkTopic) -> Result<(Topic, Post), StoreError> {
        let created_at = format_time(topic.created_at)?;
        let tracking = serde_json::to_string(&topic.tracking)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let topic_id = sqlx::query(
            r#"
            INSERT INTO topics (title, category_id, user_id, featured_link, archetype, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&topic.title)
        .bind(topic.category_id)
        .bind(topic.user_id)
        .bind(&topic.featured_link)
        .bind(&topic.archetype)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .last_insert_rowid();

        let post_id = sqlx::query(
            r#"
            INSERT INTO posts
            (topic_id, post_number, user_id, raw, tracking, ip_address, user_agent, referrer, created_at)
            VALUES (?, 1, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(topic_id)
        .bind(topic.user_id)
        .bind(&topic.raw)
        .bind(&tracking)
        .bind(&topic.metadata.ip_address)
        .bind(&topic.metadata.user_agent)
        .bind(&topic.metadata.referrer)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .last_insert_rowid();

        tx.commit().await.map_err(db_error)?;

        let created = Topic {
            id: topic_id,
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
            id: post_id,
            topic_id,
            post_number: 1,
            user_id: topic.user_id,
            raw: topic.raw.clone(),
            tracking: topic.tracking.clone(),
            metadata: topic.metadata.clone(),
            created_at: topic.created_at,
        };

        Ok((created, post))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?");
        let row: Option<TopicRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(topic_from_row).transpose()
    }

    async fn update_topic(&self, topic: &Topic) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE topics
            SET title = ?, category_id = ?, featured_link = ?, closed = ?, visible = ?
            WHERE id = ?
            "#,
        )
        .bind(&topic.title)
        .bind(topic.category_id)
        .bind(&topic.featured_link)
        .bind(topic.closed)
        .bind(topic.visible)
        .bind(topic.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(format!("topic {}", topic.id)));
        }
        Ok(())
    }

    async fn posts_for_topic(&self, id: TopicId) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, topic_id, post_number, user_id, raw, tracking,
                   ip_address, user_agent, referrer, created_at
            FROM posts
            WHERE topic_id = ?
            ORDER BY post_number
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(post_from_row).collect()
    }

    async fn latest_topics(&self, limit: usize) -> Result<Vec<Topic>, StoreError> {
        self.query_topics("", None, Some(limit)).await
    }

    async fn visible_topics(
        &self,
        category_id: Option<CategoryId>,
        limit: usize,
    ) -> Result<Vec<Topic>, StoreError> {
        match category_id {
            Some(id) => {
                self.query_topics("WHERE visible = 1 AND category_id = ?", Some(id), Some(limit))
                    .await
            }
            None => self.query_topics("WHERE visible = 1", None, Some(limit)).await,
        }
    }

    async fn topics_by_user(&self, user_id: UserId) -> Result<Vec<Topic>, StoreError> {
        self.query_topics("WHERE user_id = ?", Some(user_id), None)
            .await
    }
}
