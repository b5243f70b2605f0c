//! UI-facing view of the speech event stream.
//!
//! [`SpeakingTracker`] folds [`SpeechEvent`]s into the two indicators a chat
//! window shows ("generating audio", "speaking"). Every failure, cancel or
//! stop clears both, so an indicator can never stick.

use medtalk_core::{SessionId, SessionState, SpeechErrorKind, SpeechEvent};
use tokio::sync::mpsc;

/// How a speak action ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Audio played to the end.
    Played,
    /// The stream finished without any audio; nothing was played.
    Silent,
    /// The server could not synthesise audio.
    Unavailable { reason: String },
    /// The request or playback failed.
    Failed { kind: SpeechErrorKind, message: String },
    /// The session was cancelled before it completed.
    Cancelled,
    /// Playback was stopped before it drained.
    Stopped,
}

/// Generating/speaking flags derived from events.
#[derive(Debug, Clone, Default)]
pub struct SpeakingTracker {
    session: Option<SessionId>,
    generating: bool,
    speaking: bool,
    buffered_bytes: usize,
    last_error: Option<String>,
}

impl SpeakingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request is in flight or its body is still being read.
    pub const fn is_generating(&self) -> bool {
        self.generating
    }

    /// Audio is currently audible.
    pub const fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The session the flags describe.
    pub const fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Fold one event into the flags.
    ///
    /// A `Requesting` transition adopts its session; events from any other
    /// session are ignored after that.
    pub fn apply(&mut self, event: &SpeechEvent) {
        if let SpeechEvent::StateChanged {
            session,
            state: SessionState::Requesting,
        } = event
        {
            self.session = Some(*session);
            self.generating = true;
            self.speaking = false;
            self.buffered_bytes = 0;
            self.last_error = None;
            return;
        }

        if self.session.is_some_and(|s| s != event.session()) {
            return;
        }

        match event {
            SpeechEvent::StateChanged { state, .. } => match state {
                SessionState::Idle => {}
                SessionState::Requesting | SessionState::Streaming | SessionState::Finalizing => {
                    self.generating = true;
                }
                SessionState::Completed => self.generating = false,
                SessionState::Cancelled | SessionState::Failed => self.clear(),
            },
            SpeechEvent::ChunkAppended { total, .. } => self.buffered_bytes = *total,
            SpeechEvent::Started { .. } => {
                self.generating = false;
                self.speaking = true;
            }
            SpeechEvent::Errored { message, .. } => {
                self.last_error = Some(message.clone());
                self.clear();
            }
            SpeechEvent::Ended { .. }
            | SpeechEvent::Stopped { .. }
            | SpeechEvent::Cancelled { .. }
            | SpeechEvent::VoiceUnavailable { .. } => self.clear(),
        }
    }

    /// Apply events for `session` until its outcome is known.
    ///
    /// Returns `None` if the channel closes first.
    pub async fn follow(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<SpeechEvent>,
        session: SessionId,
    ) -> Option<SpeakOutcome> {
        while let Some(event) = rx.recv().await {
            self.apply(&event);
            if event.session() != session {
                continue;
            }
            if let Some(outcome) = self.outcome_of(&event) {
                return Some(outcome);
            }
        }
        None
    }

    fn outcome_of(&self, event: &SpeechEvent) -> Option<SpeakOutcome> {
        match event {
            SpeechEvent::Ended { .. } => Some(SpeakOutcome::Played),
            SpeechEvent::Stopped { .. } => Some(SpeakOutcome::Stopped),
            SpeechEvent::Cancelled { .. } => Some(SpeakOutcome::Cancelled),
            SpeechEvent::VoiceUnavailable { reason, .. } => Some(SpeakOutcome::Unavailable {
                reason: reason.clone(),
            }),
            SpeechEvent::Errored { kind, message, .. } => Some(SpeakOutcome::Failed {
                kind: *kind,
                message: message.clone(),
            }),
            // Completing without a single byte means playback is skipped and
            // no further event will follow.
            SpeechEvent::StateChanged {
                state: SessionState::Completed,
                ..
            } if self.buffered_bytes == 0 => Some(SpeakOutcome::Silent),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.generating = false;
        self.speaking = false;
    }
}

/// Wait for the outcome of `session`, discarding events of other sessions.
pub async fn wait_for_outcome(
    rx: &mut mpsc::UnboundedReceiver<SpeechEvent>,
    session: SessionId,
) -> Option<SpeakOutcome> {
    SpeakingTracker::new().follow(rx, session).await
}
