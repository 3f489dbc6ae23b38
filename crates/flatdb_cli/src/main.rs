//! FlatDB CLI
//!
//! Command-line tools for FlatDB data directories.
//!
//! # Commands
//!
//! - `inspect` - List records, pending reservations and staging files
//! - `clean` - Remove staging files and empty placeholders left by
//!   transactions that never finished

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing_subscriber::EnvFilter;

/// FlatDB command-line tools.
#[derive(Parser)]
#[command(name = "flatdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the contents of a data directory
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Extension of record files
        #[arg(short, long, default_value = "json")]
        extension: String,
    },

    /// Remove leftovers of unfinished transactions
    Clean {
        /// Dry run - show what would be removed
        #[arg(short, long)]
        dry_run: bool,

        /// Only remove files older than this many seconds
        #[arg(short, long, default_value = "300")]
        min_age: u64,

        /// Extension of record files
        #[arg(short, long, default_value = "json")]
        extension: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format, extension } => {
            let path = cli.path.ok_or("Data directory path required for inspect")?;
            commands::inspect::run(&path, &extension, &format, SystemTime::now())?;
        }
        Commands::Clean {
            dry_run,
            min_age,
            extension,
        } => {
            let path = cli.path.ok_or("Data directory path required for clean")?;
            commands::clean::run(
                &path,
                &extension,
                Duration::from_secs(min_age),
                dry_run,
                SystemTime::now(),
            )?;
        }
        Commands::Version => {
            println!("FlatDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("FlatDB Core v{}", flatdb_core::VERSION);
        }
    }

    Ok(())
}
