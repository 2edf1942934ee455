//! Command-line interface for wpsync.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use wpsync_core::config::WpSyncConfig;
use wpsync_core::logging::{init_logging, LogFormat, LogLevel};
use wpsync_core::remote::Capability;

mod commands;
mod output;

pub use output::*;

/// CLI arguments parser
#[derive(Debug, Parser)]
#[command(name = "wpsync", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a blog's categories
    Categories {
        /// Blog name from the configuration
        blog: String,
    },

    /// Fetch a blog's options
    Options { blog: String },

    /// Fetch a blog's media library
    Media { blog: String },

    /// Fetch the post formats a blog supports
    PostFormats { blog: String },

    /// Fetch media, options and post formats together, reporting each as it arrives
    Metadata { blog: String },

    /// Sync one blog, or every configured blog
    Sync {
        /// Blog name; all blogs when omitted
        blog: Option<String>,
    },

    /// Show or change editor preferences
    Editor {
        #[command(subcommand)]
        action: EditorAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum EditorAction {
    /// Print the current preferences
    Show,

    /// Change preferences
    Set {
        /// Enable or disable the visual editor
        #[arg(long)]
        visual: Option<bool>,

        /// Enable or disable the native editor
        #[arg(long)]
        native: Option<bool>,
    },
}

/// Load the configuration; a missing default file yields the defaults
fn load_config(path: Option<&Path>) -> Result<WpSyncConfig> {
    match path {
        Some(path) => WpSyncConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let path = WpSyncConfig::default_path();
            if path.exists() {
                WpSyncConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))
            } else {
                debug!("No config at {}; using defaults", path.display());
                Ok(WpSyncConfig::default())
            }
        }
    }
}

/// Run the CLI application
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// Run with already parsed arguments
pub async fn run_with(cli: Cli) -> Result<()> {
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(level, format)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Categories { blog } => {
            commands::execute_fetch(&config, &blog, Capability::Categories).await
        }
        Commands::Options { blog } => {
            commands::execute_fetch(&config, &blog, Capability::Options).await
        }
        Commands::Media { blog } => {
            commands::execute_fetch(&config, &blog, Capability::MediaLibrary).await
        }
        Commands::PostFormats { blog } => {
            commands::execute_fetch(&config, &blog, Capability::PostFormats).await
        }
        Commands::Metadata { blog } => commands::execute_metadata(&config, &blog).await,
        Commands::Sync { blog } => commands::execute_sync(&config, blog.as_deref()).await,
        Commands::Editor { action } => commands::execute_editor(&config, action),
    }
}
