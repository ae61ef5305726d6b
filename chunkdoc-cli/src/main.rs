//! chunkdoc CLI
//!
//! Edits key/value documents stored as content-defined chunks in a local
//! sled database, and reports how much of each write was reused.
//!
//! # Commands
//! - `set` - Set a key in a document
//! - `del` - Remove a key from a document
//! - `get` - Print a document or one of its keys
//! - `export` - Write the raw stored log to a file
//! - `stats` - Show chunk meta for a document
//! - `compact` - Materialize a document's log now
//! - `chunk` - Dry-run chunking report for a local file
//!
//! # Configuration
//! Config file: ./chunkdoc.toml (override with `--config`)
//! Environment: `CHUNKDOC_DATA_DIR`, `CHUNKDOC_MATERIALIZE_EVERY`

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{chunk, compact, edit, export, get, stats};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "chunkdoc")]
#[command(about = "Chunked document storage CLI")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "chunkdoc.toml")]
    config: PathBuf,

    /// Store directory (overrides config file and environment)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set a key in a document
    Set {
        /// Document name
        name: String,
        key: String,
        value: String,
    },

    /// Remove a key from a document
    Del {
        /// Document name
        name: String,
        key: String,
    },

    /// Print a document, or a single key
    Get {
        /// Document name
        name: String,
        key: Option<String>,
    },

    /// Write the raw reconstructed log of a document to a file
    Export {
        /// Document name
        name: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show chunk meta for a document
    Stats {
        /// Document name
        name: String,
    },

    /// Decode and re-encode a document's log now
    Compact {
        /// Document name
        name: String,
    },

    /// Report how a local file would be chunked, without storing it
    Chunk {
        /// File to chunk
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only raises the default
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
    chunkdoc_engine::metrics::describe_metrics();

    // Priority: CLI args > environment > chunkdoc.toml > defaults
    let config = CliConfig::load_or_default(&cli.config)
        .with_env_overrides()
        .with_overrides(cli.data_dir);

    match cli.command {
        Commands::Set { name, key, value } => {
            let store = commands::open_store(&config)?;
            edit::set(&store, &name, &key, &value).await?;
        }

        Commands::Del { name, key } => {
            let store = commands::open_store(&config)?;
            edit::del(&store, &name, &key).await?;
        }

        Commands::Get { name, key } => {
            let store = commands::open_store(&config)?;
            get::run(&store, &name, key.as_deref()).await?;
        }

        Commands::Export { name, output } => {
            let store = commands::open_store(&config)?;
            export::run(&store, &name, &output).await?;
        }

        Commands::Stats { name } => {
            let store = commands::open_store(&config)?;
            stats::run(&store, &name).await?;
        }

        Commands::Compact { name } => {
            let store = commands::open_store(&config)?;
            compact::run(&store, &name).await?;
        }

        Commands::Chunk { path } => {
            chunk::run(&config.chunking, &path).await?;
        }
    }

    Ok(())
}
