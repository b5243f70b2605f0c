//! Speech error taxonomy.
//!
//! Every network or playback failure that reaches a caller is one of these
//! variants. Adapters keep their own richer error types internally and map
//! them here at the port boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`SpeechError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorKind {
    /// The request never left or the connection dropped mid-stream.
    Transport,
    /// The server answered, but not with something playable.
    Protocol,
    /// The audio output rejected or failed to play the buffer.
    Playback,
    /// The request was refused before any I/O happened.
    Request,
}

/// Errors surfaced by the speech path.
///
/// `Clone + PartialEq + Serialize` so an error can ride on a
/// [`SpeechEvent`](crate::events::SpeechEvent) to any number of observers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SpeechError {
    /// Request could not be sent, or the body stream broke off.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-success HTTP status.
    #[error("Speech API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status, but the response carried no body to read.
    #[error("Speech API response had no body")]
    MissingBody,

    /// The response body could not be interpreted (bad JSON, bad URL).
    #[error("Invalid response from speech API: {message}")]
    InvalidResponse { message: String },

    /// The native audio output rejected the buffer or failed mid-play.
    #[error("Playback failed: {message}")]
    Playback { message: String },

    /// Text payload was empty after trimming.
    #[error("Speech text must not be empty")]
    EmptyText,

    /// A base address or audio locator could not be turned into a URL.
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

impl SpeechError {
    /// Shorthand for a [`SpeechError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Shorthand for a [`SpeechError::Playback`].
    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }

    /// Shorthand for a [`SpeechError::InvalidResponse`].
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Which error family this belongs to.
    pub const fn kind(&self) -> SpeechErrorKind {
        match self {
            Self::Transport { .. } => SpeechErrorKind::Transport,
            Self::Status { .. } | Self::MissingBody | Self::InvalidResponse { .. } => {
                SpeechErrorKind::Protocol
            }
            Self::Playback { .. } => SpeechErrorKind::Playback,
            Self::EmptyText | Self::InvalidEndpoint { .. } => SpeechErrorKind::Request,
        }
    }

    /// Whether retrying through the buffered endpoint could plausibly help.
    ///
    /// Playback and request errors would fail identically on the second
    /// path, so only network-side failures qualify.
    pub const fn is_retryable_elsewhere(&self) -> bool {
        matches!(
            self.kind(),
            SpeechErrorKind::Transport | SpeechErrorKind::Protocol
        )
    }
}
