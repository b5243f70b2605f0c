//! Speech lifecycle events.
//!
//! The speech controller publishes these on a channel; UI layers subscribe
//! and derive their "generating" / "speaking" indicators from them instead
//! of sharing mutable flags with the controller.
//!
//! # Wire Format
//!
//! ```json
//! { "type": "chunk_appended", "session": "…", "bytes": 8192, "total": 16384 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SpeechError, SpeechErrorKind};
use crate::session::{SessionId, SessionState};

/// Everything a subscriber can observe about a speak action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechEvent {
    /// The stream session moved to a new lifecycle state.
    StateChanged {
        session: SessionId,
        state: SessionState,
    },

    /// A body chunk was buffered.
    ChunkAppended {
        session: SessionId,
        /// Size of this chunk.
        bytes: usize,
        /// Running total for the session.
        total: usize,
    },

    /// Audio output accepted the buffer and started playing.
    Started { session: SessionId },

    /// Playback drained naturally.
    Ended { session: SessionId },

    /// The session or its playback failed. Fires at most once per session.
    Errored {
        session: SessionId,
        kind: SpeechErrorKind,
        message: String,
    },

    /// Playback was stopped by the caller before it drained.
    Stopped { session: SessionId },

    /// The session was cancelled before completing. Not an error.
    Cancelled { session: SessionId },

    /// The server could not synthesise audio; the caller should fall back
    /// to text-only display. Not an error.
    VoiceUnavailable { session: SessionId, reason: String },
}

impl SpeechEvent {
    /// Build an [`SpeechEvent::Errored`] from a typed error.
    pub fn errored(session: SessionId, error: &SpeechError) -> Self {
        Self::Errored {
            session,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// The session this event belongs to.
    pub const fn session(&self) -> SessionId {
        match self {
            Self::StateChanged { session, .. }
            | Self::ChunkAppended { session, .. }
            | Self::Started { session }
            | Self::Ended { session }
            | Self::Errored { session, .. }
            | Self::Stopped { session }
            | Self::Cancelled { session }
            | Self::VoiceUnavailable { session, .. } => *session,
        }
    }

    /// Whether nothing further will be reported for this session.
    ///
    /// `StateChanged(Completed)` is not final on its own: playback events
    /// may still follow.
    pub const fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Ended { .. }
                | Self::Errored { .. }
                | Self::Stopped { .. }
                | Self::Cancelled { .. }
                | Self::VoiceUnavailable { .. }
        )
    }
}
