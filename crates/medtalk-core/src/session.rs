//! Stream session and playback lifecycle types.
//!
//! ```text
//!   Idle → Requesting → Streaming → Finalizing → Completed
//!              │            │            │
//!              └────────────┴────────────┴──→ Cancelled | Failed
//!
//!   Created → Playing → Ended | Errored | Stopped
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one speech-generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// Lifecycle of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, nothing sent yet.
    Idle,
    /// Request issued, waiting for response headers.
    Requesting,
    /// Response accepted, body chunks arriving.
    Streaming,
    /// Body ended, buffer being assembled.
    Finalizing,
    /// Buffer assembled (playback may or may not follow).
    Completed,
    /// Stopped on request. Never reported as an error.
    Cancelled,
    /// Transport or protocol failure.
    Failed,
}

impl SessionState {
    /// Terminal states never transition again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// States that count toward the one-active-stream-per-speaker limit.
    pub const fn is_network_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Streaming)
    }

    /// Whether `next` is a legal successor of `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Requesting)
            | (Self::Requesting, Self::Streaming)
            | (Self::Streaming, Self::Finalizing)
            | (Self::Finalizing, Self::Completed) => true,
            (
                Self::Idle | Self::Requesting | Self::Streaming | Self::Finalizing,
                Self::Cancelled | Self::Failed,
            ) => true,
            // Buffered delivery can learn "no audio" straight from the
            // synthesis response.
            (Self::Requesting, Self::Completed) => true,
            _ => false,
        }
    }

    /// Lowercase label, as used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a playback handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Resource allocated, output not yet accepted.
    Created,
    /// Output accepted the buffer and is playing.
    Playing,
    /// Drained naturally.
    Ended,
    /// Output rejected the buffer or failed mid-play.
    Errored,
    /// Stopped by the caller before draining.
    Stopped,
}

impl PlaybackState {
    /// Terminal states release the transient resource.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored | Self::Stopped)
    }
}

/// How the audio for a speak action is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// `POST /api/speech/stream`, body read incrementally.
    #[default]
    Stream,
    /// `POST /api/speech`, then download the returned audio locator.
    Buffered,
}

impl DeliveryMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Buffered => "buffered",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" | "streaming" => Ok(Self::Stream),
            "buffered" | "batch" | "file" => Ok(Self::Buffered),
            other => Err(format!(
                "unknown delivery mode '{other}' (expected 'stream' or 'buffered')"
            )),
        }
    }
}

/// A finalized, non-empty encoded audio resource.
///
/// The encoding is whatever the server produced (MPEG audio in practice);
/// nothing here inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer(Bytes);

impl AudioBuffer {
    /// Wrap `bytes`, or `None` if there are none.
    pub fn new(bytes: impl Into<Bytes>) -> Option<Self> {
        let bytes = bytes.into();
        (!bytes.is_empty()).then_some(Self(bytes))
    }

    /// Byte length (always > 0).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap clone of the backing storage.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }
}

impl AsRef<[u8]> for AudioBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
