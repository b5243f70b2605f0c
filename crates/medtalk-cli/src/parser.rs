//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the medtalk clinician API.
#[derive(Parser)]
#[command(name = "medtalk")]
#[command(about = "Chat with the medtalk clinician and hear the replies")]
#[command(version)]
pub struct Cli {
    /// Override the API base address for this invocation
    #[arg(long = "api-base", global = true)]
    pub api_base: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
