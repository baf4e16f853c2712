//! Subcommand implementations

pub mod category;
pub mod config;
pub mod doctor;
pub mod link;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use links_category_adapters::state::SqliteForumStore;

use crate::config::AppConfig;

/// Open the configured SQLite database
pub async fn open_store(config: &AppConfig) -> Result<SqliteForumStore> {
    SqliteForumStore::new(&config.general.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database: {}",
                config.general.database_path.display()
            )
        })
}
