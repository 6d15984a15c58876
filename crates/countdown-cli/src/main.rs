//! # countdown
//!
//! Command-line driver for the countdown store.
//!
//! It plays the part of the interactive app: it mutates the primary store,
//! exports and imports share links, and after every mutation refreshes the
//! projection that widgets read. `widget` shows what a companion process
//! would see.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use countdown_store::StorageConfig;
use tracing_subscriber::EnvFilter;

/// Share countdowns as links and keep the widget snapshot fresh.
#[derive(Parser, Debug)]
#[command(name = "countdown")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Local data directory (overrides COUNTDOWN_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Shared container directory (overrides COUNTDOWN_SHARED_DIR)
    #[arg(long, global = true)]
    shared_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a countdown
    Add {
        /// Display title
        #[arg(long, short)]
        title: String,

        /// Target instant, RFC 3339 (e.g. 2030-01-01T09:00:00Z)
        #[arg(long)]
        at: String,

        /// IANA time zone
        #[arg(long, default_value = "UTC")]
        tz: String,

        /// Font style: default, serif, rounded or monospaced
        #[arg(long, default_value = "default")]
        font: String,

        /// Background color as hex RGB
        #[arg(long, conflicts_with = "image")]
        color: Option<String>,

        /// Background image file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Reminder offset in minutes relative to the target (repeatable)
        #[arg(long = "remind", allow_hyphen_values = true)]
        reminders: Vec<i32>,
    },

    /// List countdowns
    List {
        /// Include archived countdowns
        #[arg(long)]
        all: bool,
    },

    /// Print the share link for a countdown
    Export {
        /// Countdown id
        id: String,
    },

    /// Import a countdown from a share link
    Import {
        /// Share link (countdown://share?data=...)
        locator: String,
    },

    /// Archive (or unarchive) a countdown
    Archive {
        /// Countdown id
        id: String,

        /// Unarchive instead
        #[arg(long)]
        undo: bool,
    },

    /// Delete a countdown
    Delete {
        /// Countdown id
        id: String,
    },

    /// Rewrite the widget projection from the database
    Refresh,

    /// Show what a widget would read
    Widget {
        /// Only these ids
        #[arg(long)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output can be piped.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,countdown_shared=info,countdown_store=info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = StorageConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(dir) = cli.shared_dir {
        config.shared_dir = Some(dir);
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Add {
            title,
            at,
            tz,
            font,
            color,
            image,
            reminders,
        } => {
            let draft = commands::Draft {
                title,
                at,
                time_zone: tz,
                font,
                color,
                image,
                reminders,
            };
            commands::add(&config, draft).await?;
        }
        Commands::List { all } => commands::list(&config, all)?,
        Commands::Export { id } => commands::export(&config, &id)?,
        Commands::Import { locator } => commands::import(&config, &locator).await?,
        Commands::Archive { id, undo } => commands::archive(&config, &id, !undo).await?,
        Commands::Delete { id } => commands::delete(&config, &id).await?,
        Commands::Refresh => commands::refresh(&config).await?,
        Commands::Widget { ids } => commands::widget(&config, &ids)?,
    }

    Ok(())
}
