//! Request/cancel controller - one speech request per speak action.
//!
//! A [`SpeakerController`] owns the single active stream session for one
//! speaker context. Starting a new session first cancels the previous one
//! and waits for its read loop to exit, so two sessions of the same speaker
//! are never network-active at once.
//!
//! ```text
//!   start(req) ──▶ cancel previous ──▶ Requesting ──▶ Streaming ─┐
//!                                                                 │ chunks
//!                  Completed ◀── Finalizing ◀── end of body ◀─────┘
//!                      │
//!                      └──▶ PlaybackAdapter (non-empty buffer only)
//! ```
//!
//! Cancellation is cooperative: the read loop checks the session's token
//! before each suspension (headers, every body read) and stops without
//! reporting an error.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use medtalk_core::{
    AudioBuffer, AudioStream, DEFAULT_LANGUAGE, DEFAULT_SPEAKER_ID, DeliveryMode, SessionId,
    SessionState, SpeechError, SpeechEvent, SpeechRequest, SpeechSettings, SpeechTransport,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accumulator::{ChunkAccumulator, Finalized};
use crate::playback::{PlaybackAdapter, PlaybackHandle};

/// Reason reported when buffered synthesis returns no audio and no message.
const VOICE_UNAVAILABLE: &str = "voice generation unavailable";

// ── Configuration ──────────────────────────────────────────────────

/// Configuration for one [`SpeakerController`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerConfig {
    /// Label of the speaker context, used in logs.
    pub speaker: String,

    /// How audio is fetched.
    pub delivery: DeliveryMode,

    /// Speaker persona sent when a request leaves it unset.
    pub speaker_id: String,

    /// Language sent when a request leaves it unset.
    pub language: String,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            speaker: "default".to_string(),
            delivery: DeliveryMode::default(),
            speaker_id: DEFAULT_SPEAKER_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl SpeakerConfig {
    /// Defaults for everything the settings cover.
    pub fn from_settings(speaker: impl Into<String>, settings: &SpeechSettings) -> Self {
        Self {
            speaker: speaker.into(),
            delivery: settings.effective_delivery(),
            speaker_id: settings.effective_speaker_id().to_string(),
            language: settings.effective_language().to_string(),
        }
    }
}

// ── Session ticket ─────────────────────────────────────────────────

/// Caller's view of one started session.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    id: SessionId,
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
}

impl SessionTicket {
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Latest lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Signal this session's cancellation token.
    ///
    /// Unlike [`SpeakerController::cancel`] this does not wait for the read
    /// loop to exit, and it leaves any playback alone.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the session reaches `Completed`, `Cancelled` or `Failed`.
    pub async fn wait_terminal(&mut self) -> SessionState {
        let reached = self
            .state
            .wait_for(|s| s.is_terminal())
            .await
            .map(|s| *s);
        reached.unwrap_or_else(|_| *self.state.borrow())
    }
}

// ── Controller ─────────────────────────────────────────────────────

struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the at-most-one active stream session of a speaker context.
pub struct SpeakerController {
    config: SpeakerConfig,
    transport: Arc<dyn SpeechTransport>,
    playback: PlaybackAdapter,
    events_tx: mpsc::UnboundedSender<SpeechEvent>,
    active: Option<ActiveSession>,
    current_playback: Arc<Mutex<Option<PlaybackHandle>>>,
}

impl SpeakerController {
    /// Create a controller.
    ///
    /// Returns the controller and a receiver for [`SpeechEvent`]s.
    #[must_use]
    pub fn new(
        config: SpeakerConfig,
        transport: Arc<dyn SpeechTransport>,
        playback: PlaybackAdapter,
    ) -> (Self, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            config,
            transport,
            playback,
            events_tx,
            active: None,
            current_playback: Arc::new(Mutex::new(None)),
        };

        (controller, events_rx)
    }

    pub const fn config(&self) -> &SpeakerConfig {
        &self.config
    }

    pub const fn delivery(&self) -> DeliveryMode {
        self.config.delivery
    }

    /// Switch delivery for sessions started from now on.
    pub fn set_delivery(&mut self, delivery: DeliveryMode) {
        self.config.delivery = delivery;
    }

    pub const fn playback(&self) -> &PlaybackAdapter {
        &self.playback
    }

    /// The most recently started session, if its task is still running.
    pub fn active_session(&self) -> Option<SessionId> {
        self.active
            .as_ref()
            .filter(|a| !a.task.is_finished())
            .map(|a| a.id)
    }

    /// Handle of the most recent playback, whatever its state.
    pub fn current_playback(&self) -> Option<PlaybackHandle> {
        lock(&self.current_playback).clone()
    }

    /// Start a new session for `request`.
    ///
    /// Blank text is rejected before anything else happens. Otherwise the
    /// previous session is cancelled (and its playback stopped) before the
    /// new one enters `Requesting`.
    pub async fn start(
        &mut self,
        mut request: SpeechRequest,
    ) -> Result<SessionTicket, SpeechError> {
        if request.is_blank() {
            return Err(SpeechError::EmptyText);
        }

        self.cancel().await;

        request
            .speaker_id
            .get_or_insert_with(|| self.config.speaker_id.clone());
        request
            .language
            .get_or_insert_with(|| self.config.language.clone());

        let id = SessionId::new();
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let run = SessionRun {
            id,
            request,
            delivery: self.config.delivery,
            transport: Arc::clone(&self.transport),
            playback: self.playback.clone(),
            current_playback: Arc::clone(&self.current_playback),
            cancel: cancel.clone(),
            state: state_tx,
            events: self.events_tx.clone(),
        };

        tracing::debug!(
            speaker = %self.config.speaker,
            session = %id,
            delivery = %self.config.delivery,
            "Starting speech session"
        );
        run.set_state(SessionState::Requesting);
        let task = tokio::spawn(run.run());

        self.active = Some(ActiveSession {
            id,
            cancel: cancel.clone(),
            task,
        });

        Ok(SessionTicket {
            id,
            state: state_rx,
            cancel,
        })
    }

    /// Convenience for [`start`](Self::start) with only text.
    pub async fn speak(&mut self, text: impl Into<String>) -> Result<SessionTicket, SpeechError> {
        self.start(SpeechRequest::new(text)).await
    }

    /// Cancel the active session and stop its playback.
    ///
    /// Waits for the read loop to exit. Idempotent; a no-op when nothing is
    /// active.
    ///
    /// Playback is stopped before waiting, so a sink still deciding whether
    /// to accept the buffer can no longer report `Started` or `Errored`.
    pub async fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            self.stop_playback();
            if let Err(e) = active.task.await {
                tracing::warn!(session = %active.id, error = %e, "Speech session task did not exit cleanly");
            }
        }
        self.stop_playback();
    }

    /// Stop current playback without touching any session.
    pub fn stop_playback(&self) {
        let handle = lock(&self.current_playback).take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }
}

impl Drop for SpeakerController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
        self.stop_playback();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Session task ───────────────────────────────────────────────────

/// Why a session stopped short of `Completed`.
enum Halt {
    Cancelled,
    Failed(SpeechError),
}

impl From<SpeechError> for Halt {
    fn from(error: SpeechError) -> Self {
        Self::Failed(error)
    }
}

/// What a finished read produced.
enum Fetched {
    Audio(AudioBuffer),
    Empty,
    Unavailable(String),
}

struct SessionRun {
    id: SessionId,
    request: SpeechRequest,
    delivery: DeliveryMode,
    transport: Arc<dyn SpeechTransport>,
    playback: PlaybackAdapter,
    current_playback: Arc<Mutex<Option<PlaybackHandle>>>,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
    events: mpsc::UnboundedSender<SpeechEvent>,
}

impl SessionRun {
    async fn run(self) {
        match self.fetch().await {
            Ok(Fetched::Audio(audio)) => {
                self.set_state(SessionState::Completed);
                self.play(audio).await;
            }
            Ok(Fetched::Empty) => {
                tracing::debug!(session = %self.id, "Stream ended without audio, skipping playback");
                self.set_state(SessionState::Completed);
            }
            Ok(Fetched::Unavailable(reason)) => {
                tracing::info!(session = %self.id, %reason, "Voice unavailable, text only");
                self.emit(SpeechEvent::VoiceUnavailable {
                    session: self.id,
                    reason,
                });
                self.set_state(SessionState::Completed);
            }
            Err(Halt::Cancelled) => {
                tracing::debug!(session = %self.id, "Speech session cancelled");
                self.emit(SpeechEvent::Cancelled { session: self.id });
                self.set_state(SessionState::Cancelled);
            }
            Err(Halt::Failed(error)) => {
                tracing::warn!(session = %self.id, %error, "Speech session failed");
                self.emit(SpeechEvent::errored(self.id, &error));
                self.set_state(SessionState::Failed);
            }
        }
    }

    async fn fetch(&self) -> Result<Fetched, Halt> {
        let stream = match self.delivery {
            DeliveryMode::Stream => self.guard(self.transport.open_stream(&self.request)).await??,
            DeliveryMode::Buffered => {
                let response = self.guard(self.transport.synthesize(&self.request)).await??;
                let locator = response.audio_url.filter(|url| !url.trim().is_empty());
                let Some(locator) = locator else {
                    let reason = response
                        .error
                        .filter(|e| !e.trim().is_empty())
                        .unwrap_or_else(|| VOICE_UNAVAILABLE.to_string());
                    return Ok(Fetched::Unavailable(reason));
                };
                self.guard(self.transport.fetch_audio(&locator)).await??
            }
        };

        self.set_state(SessionState::Streaming);
        let accumulator = self.read_body(stream).await?;

        self.set_state(SessionState::Finalizing);
        Ok(match accumulator.finalize() {
            Finalized::Audio(audio) => Fetched::Audio(audio),
            Finalized::Empty => Fetched::Empty,
        })
    }

    async fn read_body(&self, mut stream: AudioStream) -> Result<ChunkAccumulator, Halt> {
        let mut accumulator = ChunkAccumulator::new();
        while let Some(chunk) = self.guard(stream.next()).await? {
            let chunk = chunk?;
            let bytes = chunk.len();
            let total = accumulator.append(chunk);
            self.emit(SpeechEvent::ChunkAppended {
                session: self.id,
                bytes,
                total,
            });
        }
        tracing::debug!(
            session = %self.id,
            chunks = accumulator.chunk_count(),
            bytes = accumulator.total_bytes(),
            "Speech body complete"
        );
        Ok(accumulator)
    }

    async fn play(&self, audio: AudioBuffer) {
        if self.cancel.is_cancelled() {
            tracing::debug!(session = %self.id, "Cancelled before playback, skipping");
            return;
        }

        let handle = self.playback.prepare(self.id, audio, self.events.clone());
        *lock(&self.current_playback) = Some(handle.clone());

        // A cancel that emptied the slot before this handle was published
        // never saw it, so stop it here.
        if self.cancel.is_cancelled() {
            handle.stop();
            return;
        }
        handle.start().await;
    }

    /// Race `fut` against cancellation, cancellation first.
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Halt> {
        tokio::select! {
            biased;

            () = self.cancel.cancelled() => Err(Halt::Cancelled),

            out = fut => Ok(out),
        }
    }

    fn set_state(&self, next: SessionState) {
        let prev = *self.state.borrow();
        debug_assert!(
            prev.can_transition_to(next),
            "illegal session transition {prev} -> {next}"
        );
        // Event first, so anyone woken by the state change can drain it.
        self.emit(SpeechEvent::StateChanged {
            session: self.id,
            state: next,
        });
        self.state.send_replace(next);
    }

    fn emit(&self, event: SpeechEvent) {
        let _ = self.events.send(event);
    }
}
