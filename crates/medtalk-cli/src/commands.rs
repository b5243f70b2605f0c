//! Commands enum and subcommands.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize text and play it (or save it with --out)
    Speak {
        /// Text to speak
        text: String,
        /// Chat session the utterance belongs to
        #[arg(long)]
        session: Option<String>,
        /// Speaker persona (defaults to MEDTALK_SPEAKER)
        #[arg(long)]
        speaker: Option<String>,
        /// Synthesis language (defaults to MEDTALK_LANGUAGE)
        #[arg(long)]
        language: Option<String>,
        /// Synthesize the whole reply before playing instead of streaming
        #[arg(long)]
        buffered: bool,
        /// Do not retry a failed stream through the buffered endpoint
        #[arg(long)]
        no_fallback: bool,
        /// Write the audio to this file instead of playing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send a message to the clinician
    Chat {
        /// Message text
        message: String,
        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
        /// Speak the reply
        #[arg(long)]
        speak: bool,
        /// Write the spoken reply to this file instead of playing it
        #[arg(short, long, requires = "speak")]
        out: Option<PathBuf>,
    },

    /// Manage chat sessions
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Show the messages of a session
    History {
        /// Session to show
        session_id: String,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Check that the API is up
    Health {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show who the clinician is
    Clinician,
}

/// `session` subcommands.
#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a new chat session and print its id
    New,
}
