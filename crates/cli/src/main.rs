//! Pagewise CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Create the config file
//! - `config`: Validate, show, or locate the configuration
//! - `stats`: Document statistics
//! - `context`: Print the context assembled for a question
//! - `ask`: Ask one question, or chat interactively about a document
//! - `topics`: List detected topics
//! - `plan`: Build a study plan from the detected topics
//! - `doctor`: Diagnose setup problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pagewise",
    about = "Pagewise — ask questions about large documents",
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
    /// Create the configuration file
    Onboard,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show word, page and size statistics for a document
    Stats {
        /// Document to inspect
        file: PathBuf,
    },

    /// Print the context that would be sent for a question
    Context {
        /// Document to read
        file: PathBuf,

        /// The question to select content for
        #[arg(short, long)]
        query: String,

        /// Override the context budget, in tokens
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// Ask questions about a document
    Ask {
        /// Document to read
        file: PathBuf,

        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,

        /// Override the context budget, in tokens
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// List the topics detected in a document
    Topics {
        /// Document to read
        file: PathBuf,
    },

    /// Build a study plan for a document
    Plan {
        /// Document to read
        file: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose setup problems
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Check the configuration file for errors
    Validate,
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the configuration file path
    Path,
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
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::Stats { file } => commands::stats::run(&file).await?,
        Commands::Context {
            file,
            query,
            max_tokens,
        } => commands::context::run(&file, &query, max_tokens).await?,
        Commands::Ask {
            file,
            question,
            max_tokens,
        } => commands::ask::run(&file, question, max_tokens).await?,
        Commands::Topics { file } => commands::topics::run(&file).await?,
        Commands::Plan { file, json } => commands::plan::run(&file, json).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
