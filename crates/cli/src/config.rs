//! Configuration loading and management

use anyhow::{Context, Result};
use links_category_domain::LinksCategorySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub links_category: LinksCategoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Site settings of the links category feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksCategoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub show_onebox_in_post: bool,

    #[serde(default = "default_anchor_style")]
    pub digest_email_anchor_style: String,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("./links-category.sqlite")
}

fn default_bind() -> String {
    "127.0.0.1:4200".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_anchor_style() -> String {
    LinksCategorySettings::default().digest_email_anchor_style
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

impl Default for LinksCategoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            show_onebox_in_post: default_true(),
            digest_email_anchor_style: default_anchor_style(),
        }
    }
}

impl From<&LinksCategoryConfig> for LinksCategorySettings {
    fn from(config: &LinksCategoryConfig) -> Self {
        Self {
            enabled: config.enabled,
            show_onebox_in_post: config.show_onebox_in_post,
            digest_email_anchor_style: config.digest_email_anchor_style.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("LINKS_CATEGORY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn settings(&self) -> LinksCategorySettings {
        LinksCategorySettings::from(&self.links_category)
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r##"# links-category configuration

[general]
database_path = "./links-category.sqlite"
bind = "127.0.0.1:4200"
log_level = "info"

[links_category]
# Allow link topics in categories with enable_links_category set
enabled = true
# Put the link itself in the first post so it renders as a onebox
show_onebox_in_post = true
digest_email_anchor_style = "color: #0088cc; text-decoration: none;"
"##
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.general.database_path, defaults.general.database_path);
        assert_eq!(parsed.general.bind, defaults.general.bind);
        assert_eq!(parsed.settings(), defaults.settings());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[links_category]\nenabled = false\n").unwrap();

        let settings = parsed.settings();
        assert!(!settings.enabled);
        assert!(settings.show_onebox_in_post);
        assert_eq!(parsed.general.log_level, "info");
    }
}
