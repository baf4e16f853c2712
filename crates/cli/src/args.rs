//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// links-category: link-only forum categories with featured link topics
#[derive(Parser, Debug)]
#[command(name = "links-category")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Normalize a featured link
    Normalize(LinkArgs),

    /// Print the display domain of a link
    Domain(LinkArgs),

    /// Manage categories
    Category(CategoryArgs),

    /// Manage users
    User(UserArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides general.bind)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Link as submitted by a user
    pub link: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub command: CategoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a category
    Create {
        /// Category name
        #[arg(long)]
        name: String,

        /// Restrict the category to link topics
        #[arg(long)]
        links_only: bool,
    },

    /// Turn the link-only policy of a category on or off
    SetLinksOnly {
        /// Category id
        id: i64,

        /// New policy value
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// List categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user
    Create {
        /// Username, matched case-insensitively
        #[arg(long)]
        username: String,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,

        /// Grant moderator rights
        #[arg(long)]
        moderator: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
