//! Command-line interface for the `agui` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Talk to an AG-UI agent endpoint
#[derive(Parser, Debug)]
#[command(name = "agui", version, about = "AG-UI run client")]
pub struct Cli {
    /// TOML config file; AGUI_* environment variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one prompt and stream the agent's reply
    Chat(ChatArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Run endpoint (overrides AGUI_ENDPOINT)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Continue an existing conversation thread
    #[arg(short, long)]
    pub thread: Option<String>,

    /// System prompt sent ahead of the user message
    #[arg(short, long)]
    pub system: Option<String>,

    /// Opaque JSON context forwarded with the run
    #[arg(long)]
    pub context: Option<String>,

    /// User prompt
    pub prompt: String,
}
