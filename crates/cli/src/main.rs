//! Recollect CLI — the main entry point.
//!
//! Commands:
//! - `ingest`       — Extract and consolidate a transcript into a thread
//! - `recall`       — Rank a thread's memory for a purpose
//! - `working-set`  — Build the prompt-ready working set
//! - `stats`        — Show per-thread item counts
//! - `config`       — Print the effective or default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "recollect",
    about = "Recollect — thread memory and working sets for LLM gateways",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a transcript file (or `-` for stdin) into a thread
    Ingest {
        /// Thread to consolidate into
        #[arg(short, long, default_value = "default")]
        thread: String,

        /// Source label recorded on episodic items
        #[arg(short, long)]
        source: Option<String>,

        /// Transcript path, or `-` to read stdin
        input: PathBuf,

        /// Print the ingest report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank a thread's memory for a purpose
    Recall {
        #[arg(short, long)]
        thread: String,

        /// What the caller is about to do
        #[arg(short, long)]
        purpose: String,

        /// Token budget (defaults to the configured budget)
        #[arg(short, long)]
        budget: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Recall and package the result as a working set
    WorkingSet {
        #[arg(short, long)]
        thread: String,

        #[arg(short, long)]
        purpose: String,

        #[arg(short, long)]
        budget: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show per-thread item counts
    Stats,

    /// Print the effective configuration
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ingest {
            thread,
            source,
            input,
            json,
        } => commands::ingest::run(&thread, source.as_deref(), &input, json).await?,
        Commands::Recall {
            thread,
            purpose,
            budget,
            json,
        } => commands::context::recall(&thread, &purpose, budget, json).await?,
        Commands::WorkingSet {
            thread,
            purpose,
            budget,
            json,
        } => commands::context::working_set(&thread, &purpose, budget, json).await?,
        Commands::Stats => commands::stats::run().await?,
        Commands::Config { default } => commands::config_cmd::show(default)?,
    }

    Ok(())
}
