//! SoupSync CLI
//!
//! Command-line tools for running sync targets against JSON files.
//!
//! # Commands
//!
//! - `inspect-target` - Validate and display a persisted target
//! - `refresh` - Re-fetch every record of a soup from a remote dataset
//! - `ghosts` - Remove local records deleted remotely

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SoupSync command-line sync tools.
#[derive(Parser)]
#[command(name = "soupsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and display a persisted target
    InspectTarget {
        /// Path to the target JSON file
        #[arg(short, long)]
        target: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Re-fetch every record of a soup
    Refresh {
        /// Path to the refresh target JSON file
        #[arg(short, long)]
        target: PathBuf,

        /// Path to the store snapshot, rewritten on success
        #[arg(short, long)]
        store: PathBuf,

        /// Path to the remote dataset (object type to records)
        #[arg(short, long)]
        remote: PathBuf,

        /// Override the number of ids per remote query
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Remove local records that no longer exist remotely
    Ghosts {
        /// Path to the target JSON file
        #[arg(short, long)]
        target: PathBuf,

        /// Path to the store snapshot, rewritten unless dry run
        #[arg(short, long)]
        store: PathBuf,

        /// Path to the remote dataset (object type to records)
        #[arg(short, long)]
        remote: PathBuf,

        /// Soup to clean, required for query targets
        #[arg(long)]
        soup: Option<String>,

        /// Dry run - report ghosts without deleting them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::InspectTarget { target, format } => {
            commands::inspect_target::run(&target, &format)?;
        }
        Commands::Refresh {
            target,
            store,
            remote,
            batch_size,
        } => {
            commands::refresh::run(&target, &store, &remote, batch_size)?;
        }
        Commands::Ghosts {
            target,
            store,
            remote,
            soup,
            dry_run,
        } => {
            commands::ghosts::run(&target, &store, &remote, soup.as_deref(), dry_run)?;
        }
        Commands::Version => {
            println!("SoupSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Default batch size: {} ids per query",
                soupsync_engine::DEFAULT_BATCH_SIZE
            );
        }
    }

    Ok(())
}
