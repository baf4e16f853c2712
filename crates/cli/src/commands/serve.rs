//! Serve command - run the HTTP API

use anyhow::{Context, Result};
use links_category_adapters::http::{self, AppState};
use links_category_domain::SystemClock;
use links_category_domain::cache::CACHE_NAMESPACE;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::args::ServeArgs;
use crate::config::AppConfig;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load config")?;
    let settings = config.settings();
    let bind = args.bind.unwrap_or_else(|| config.general.bind.clone());

    tracing::info!(
        bind = %bind,
        database = %config.general.database_path.display(),
        enabled = settings.enabled,
        show_onebox_in_post = settings.show_onebox_in_post,
        "Starting links-category"
    );

    let store = Arc::new(super::open_store(&config).await?);
    // Shared with CLI category writes through the database
    let cache = Arc::new(store.category_cache(CACHE_NAMESPACE));
    let state = AppState::new(settings, store, cache, Arc::new(SystemClock));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    http::serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
    })
    .await
    .context("HTTP server error")?;

    tracing::info!("links-category stopped");
    Ok(())
}
