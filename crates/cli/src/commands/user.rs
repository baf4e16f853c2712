//! User command - manage forum users

use anyhow::{Context, Result};
use links_category_domain::{NewUser, UserStore};
use std::path::PathBuf;

use crate::args::{UserArgs, UserCommands};
use crate::config::AppConfig;

pub async fn execute(args: UserArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load config")?;
    let store = super::open_store(&config).await?;

    match args.command {
        UserCommands::Create {
            username,
            admin,
            moderator,
        } => {
            let user = store
                .create_user(&NewUser {
                    username,
                    admin,
                    moderator,
                })
                .await
                .context("Failed to create user")?;

            tracing::info!(user_id = user.id, username = %user.username, "Created user");
            println!(
                "Created user {} (id {}, staff: {})",
                user.username,
                user.id,
                user.is_staff()
            );
        }
    }

    Ok(())
}
