//! Config command - write a starter config.toml

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::Path;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    let ConfigCommands::Init { path, force } = args.command;

    ensure!(
        force || !path.exists(),
        "{} is already there; pass --force to replace it",
        path.display()
    );

    let content = AppConfig::example_toml();
    // The written file must load back with the same settings
    let written: AppConfig =
        toml::from_str(&content).context("Bundled example config does not parse")?;

    write_with_parents(&path, &content)?;
    tracing::debug!(path = %path.display(), force, "Wrote example config");

    let settings = written.settings();
    println!("Wrote {}", path.display());
    println!("  database:  {}", written.general.database_path.display());
    println!("  bind:      {}", written.general.bind);
    println!(
        "  enabled:   {} (onebox in post: {})",
        settings.enabled, settings.show_onebox_in_post
    );
    println!();
    println!("Any key can be overridden with LINKS_CATEGORY__<SECTION>__<KEY>.");
    println!("Mark a category for link topics with:");
    println!("  links-category category create --name Links --links-only");

    Ok(())
}

fn write_with_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Cannot write {}", path.display()))
}
