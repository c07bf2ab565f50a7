use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "promptlens")]
#[command(about = "PromptLens - turn images into reusable generation prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a prompt from an image file
    Generate {
        /// Path to a JPEG/PNG/WEBP image (max 10 MiB)
        file: PathBuf,
        /// Cancel the attempt after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
    /// Re-run generation for an existing history entry
    Regenerate {
        /// Entry id from `history`
        id: String,
    },
    /// Show the chat history
    History,
    /// Clear the chat history
    Clear,
    /// Manage saved prompts
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Show the credit balance
    Balance,
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved prompts
    List,
    /// Save a history entry, or unsave it when already saved
    Toggle { id: String },
    /// Delete a saved prompt
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            file,
            cancel_after_ms,
        } => commands::generate::run(&file, cancel_after_ms).await,
        Commands::Regenerate { id } => commands::generate::regenerate(&id).await,
        Commands::History => commands::history::list().await,
        Commands::Clear => commands::history::clear().await,
        Commands::Saved { action } => match action {
            SavedAction::List => commands::saved::list().await,
            SavedAction::Toggle { id } => commands::saved::toggle(&id).await,
            SavedAction::Delete { id } => commands::saved::delete(&id).await,
        },
        Commands::Balance => commands::balance::show().await,
    }
}
