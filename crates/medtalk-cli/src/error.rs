//! CLI-specific error types and mappings.
//!
//! Client, settings and speech errors are folded into [`CliError`] so that
//! `main` can turn any failure into a sysexits-style exit code.

use medtalk_client::ClientError;
use medtalk_core::{SettingsError, SpeechError, SpeechErrorKind};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Anything without a more specific category.
    #[error("{0}")]
    Core(String),

    /// Argument validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (output file not writable, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API could not be reached, or reports itself unhealthy.
    #[error("API unavailable: {0}")]
    Unavailable(String),

    /// The API answered with something we could not use.
    #[error("Unexpected API response: {0}")]
    Protocol(String),

    /// The audio output rejected or failed to play the reply.
    #[error("Playback failed: {0}")]
    Playback(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) | Self::Playback(_) => 74, // EX_IOERR
            Self::Protocol(_) => 76,   // EX_PROTOCOL
            Self::Config(_) => 78,     // EX_CONFIG
        }
    }

    /// Build the error for a failed speak outcome.
    pub fn from_failure(kind: SpeechErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            SpeechErrorKind::Transport => Self::Unavailable(message),
            SpeechErrorKind::Protocol => Self::Protocol(message),
            SpeechErrorKind::Playback => Self::Playback(message),
            SpeechErrorKind::Request => Self::Arguments(message),
        }
    }
}

impl From<SpeechError> for CliError {
    fn from(err: SpeechError) -> Self {
        Self::from_failure(err.kind(), err.to_string())
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        // Keep the client's message, it names the URL that failed.
        let message = err.to_string();
        Self::from_failure(SpeechError::from(err).kind(), message)
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
