// SPDX-License-Identifier: AGPL-3.0-or-later
//! omnidrive CLI
//!
//! Moves files between configured drives.

mod commands;

use clap::{Parser, Subcommand};
use od_adapters::{Config, DriveRegistry};
use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "omnidrive")]
#[command(author, version, about = "omnidrive - one file API over many storage backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a file to stdout
    Cat {
        /// File location (drive:path, od://drive/path or a local path)
        location: String,
    },

    /// Store stdin at a location, replacing any existing file
    Put {
        location: String,
    },

    /// Copy a file, possibly to another drive
    Cp {
        source: String,
        dest: String,

        /// Replace an existing destination file
        #[arg(short, long)]
        force: bool,
    },

    /// Move a file, possibly to another drive
    Mv {
        source: String,
        dest: String,

        /// Replace an existing destination file
        #[arg(short, long)]
        force: bool,
    },

    /// Remove files
    Rm {
        #[arg(required = true)]
        locations: Vec<String>,

        /// Ignore files that do not exist
        #[arg(short, long)]
        force: bool,
    },

    /// Show file metadata
    Stat {
        location: String,
    },

    /// Check whether a file exists
    Exists {
        location: String,
    },

    /// List configured drives
    Drives,
}

fn init_logging(verbose: bool, config: &Config) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::WARN)
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    init_logging(cli.verbose, &config);

    let registry = DriveRegistry::from_config(&config)?;

    match cli.command {
        Commands::Cat { location } => commands::cat(&registry, &location).await,
        Commands::Put { location } => commands::put(&registry, &location).await,
        Commands::Cp { source, dest, force } => {
            commands::cp(&registry, &source, &dest, force).await
        }
        Commands::Mv { source, dest, force } => {
            commands::mv(&registry, &source, &dest, force).await
        }
        Commands::Rm { locations, force } => commands::rm(&registry, &locations, force).await,
        Commands::Stat { location } => commands::stat(&registry, &location).await,
        Commands::Exists { location } => commands::exists(&registry, &location).await,
        Commands::Drives => commands::drives(&registry),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
