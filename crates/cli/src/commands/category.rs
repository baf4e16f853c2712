//! Category command - manage categories and their link-only policy

use anyhow::{Context, Result};
use links_category_domain::cache::CACHE_NAMESPACE;
use links_category_domain::usecases::{CategoryAdmin, CategoryChanges};
use links_category_domain::{Actor, CategoryPolicyCache, NewCategory, User};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::{CategoryArgs, CategoryCommands};
use crate::config::AppConfig;

pub async fn execute(args: CategoryArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load config")?;
    let store = Arc::new(super::open_store(&config).await?);
    let policy = Arc::new(CategoryPolicyCache::new(
        Arc::new(store.category_cache(CACHE_NAMESPACE)),
        store.clone(),
    ));
    let admin = CategoryAdmin::new(policy, store);
    let system = Actor::User(User::system());

    match args.command {
        CategoryCommands::Create { name, links_only } => {
            let category = admin
                .create(&system, NewCategory { name, links_only })
                .await
                .context("Failed to create category")?;
            println!(
                "Created category {} (id {}, links only: {})",
                category.name, category.id, category.links_only
            );
        }
        CategoryCommands::SetLinksOnly { id, enabled } => {
            let category = admin
                .update(
                    &system,
                    id,
                    CategoryChanges {
                        links_only: Some(enabled),
                        ..Default::default()
                    },
                )
                .await
                .context("Failed to update category")?;
            println!(
                "Category {} (id {}) links only: {}",
                category.name, category.id, category.links_only
            );
        }
        CategoryCommands::List { json } => {
            let categories = admin.list().await.context("Failed to list categories")?;

            if json {
                let output = serde_json::json!({
                    "count": categories.len(),
                    "categories": categories,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Categories ({} found)", categories.len());
                println!("====================");
                for category in &categories {
                    let marker = if category.links_only { " [links]" } else { "" };
                    println!("{:>4}  {}{}", category.id, category.name, marker);
                }
            }
        }
    }

    Ok(())
}
