//! Playback adapter - turns a finalized buffer into audible output.
//!
//! ```text
//!   Created ──start ok──▶ Playing ──drained──▶ Ended
//!      │                     │ └────failed───▶ Errored
//!      ├──start rejected─────┼───────────────▶ Errored
//!      └──────stop()─────────┴───────────────▶ Stopped
//! ```
//!
//! Each [`PlaybackHandle`] owns one [`BlobUrl`] and at most one native
//! player. The URL is released on the first terminal transition and never
//! again; exactly one of `Ended`, `Errored` or `Stopped` is emitted.

use std::sync::{Arc, Mutex, PoisonError};

use medtalk_core::{
    AudioBuffer, AudioSink, NativePlayer, PlaybackState, SessionId, SpeechError, SpeechEvent,
};
use tokio::sync::mpsc;

use crate::resources::{BlobRegistry, BlobUrl};

/// Creates playback handles against one audio sink.
#[derive(Clone)]
pub struct PlaybackAdapter {
    sink: Arc<dyn AudioSink>,
    blobs: BlobRegistry,
}

impl PlaybackAdapter {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self::with_registry(sink, BlobRegistry::new())
    }

    pub const fn with_registry(sink: Arc<dyn AudioSink>, blobs: BlobRegistry) -> Self {
        Self { sink, blobs }
    }

    pub const fn registry(&self) -> &BlobRegistry {
        &self.blobs
    }

    /// Allocate a handle in `Created` state without starting output.
    ///
    /// Callers that need to publish the handle before the (possibly slow)
    /// start use this followed by [`PlaybackHandle::start`].
    pub fn prepare(
        &self,
        session: SessionId,
        audio: AudioBuffer,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> PlaybackHandle {
        let url = self.blobs.create(&audio);
        PlaybackHandle {
            inner: Arc::new(HandleInner {
                session,
                audio,
                url,
                sink: Arc::clone(&self.sink),
                events,
                slot: Mutex::new(Slot {
                    state: PlaybackState::Created,
                    player: None,
                }),
            }),
        }
    }

    /// Create a handle and start playing `audio`.
    ///
    /// Always returns a handle; a rejected start leaves it `Errored` with
    /// its URL already released.
    pub async fn play(
        &self,
        session: SessionId,
        audio: AudioBuffer,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> PlaybackHandle {
        let handle = self.prepare(session, audio, events);
        handle.start().await;
        handle
    }
}

struct Slot {
    state: PlaybackState,
    player: Option<Arc<dyn NativePlayer>>,
}

struct HandleInner {
    session: SessionId,
    audio: AudioBuffer,
    url: BlobUrl,
    sink: Arc<dyn AudioSink>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    slot: Mutex<Slot>,
}

/// One audio-output instance bound to a finalized buffer.
///
/// Cloning shares the same instance.
#[derive(Clone)]
pub struct PlaybackHandle {
    inner: Arc<HandleInner>,
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("session", &self.inner.session)
            .field("url", &self.inner.url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PlaybackHandle {
    pub fn session(&self) -> SessionId {
        self.inner.session
    }

    pub fn state(&self) -> PlaybackState {
        self.slot().state
    }

    /// The transient URL this handle owns.
    pub fn url(&self) -> &str {
        self.inner.url.as_str()
    }

    pub fn audio(&self) -> &AudioBuffer {
        &self.inner.audio
    }

    /// Whether the URL has been released.
    pub fn is_released(&self) -> bool {
        self.inner.url.is_released()
    }

    /// Hand the buffer to the sink and wait for it to accept or reject.
    ///
    /// No-op unless the handle is still `Created`. If [`stop`](Self::stop)
    /// wins the race with a slow start, the freshly started player is
    /// paused immediately and `Started` is never emitted.
    pub async fn start(&self) {
        if self.state() != PlaybackState::Created {
            return;
        }

        let session = self.inner.session;
        match self.inner.sink.start(self.url(), &self.inner.audio).await {
            Err(error) => {
                tracing::warn!(session = %session, %error, "Playback rejected");
                if self.transition(PlaybackState::Created, PlaybackState::Errored).is_some() {
                    self.inner.url.release();
                    self.emit(SpeechEvent::errored(session, &error));
                }
            }
            Ok(player) => {
                {
                    let mut slot = self.slot();
                    if slot.state != PlaybackState::Created {
                        drop(slot);
                        player.pause();
                        return;
                    }
                    slot.state = PlaybackState::Playing;
                    slot.player = Some(Arc::clone(&player));
                }

                tracing::debug!(session = %session, bytes = self.inner.audio.len(), "Playback started");
                self.emit(SpeechEvent::Started { session });
                self.spawn_completion_watcher(player);
            }
        }
    }

    /// Pause any active output and release the URL.
    ///
    /// Safe to call repeatedly and in any state; only the first call on a
    /// live handle has an effect.
    pub fn stop(&self) {
        let player = {
            let mut slot = self.slot();
            match slot.state {
                PlaybackState::Created | PlaybackState::Playing => {
                    slot.state = PlaybackState::Stopped;
                    slot.player.take()
                }
                PlaybackState::Ended | PlaybackState::Errored | PlaybackState::Stopped => return,
            }
        };

        if let Some(player) = player {
            player.pause();
        }
        self.inner.url.release();
        tracing::debug!(session = %self.inner.session, "Playback stopped");
        self.emit(SpeechEvent::Stopped {
            session: self.inner.session,
        });
    }

    fn spawn_completion_watcher(&self, player: Arc<dyn NativePlayer>) {
        let handle = self.clone();
        tokio::spawn(async move {
            let outcome = player.finished().await;
            handle.on_finished(outcome);
        });
    }

    fn on_finished(&self, outcome: Result<(), SpeechError>) {
        let next = if outcome.is_ok() {
            PlaybackState::Ended
        } else {
            PlaybackState::Errored
        };
        // A stop() that got here first already reported.
        if self.transition(PlaybackState::Playing, next).is_none() {
            return;
        }

        self.inner.url.release();
        let session = self.inner.session;
        match outcome {
            Ok(()) => {
                tracing::debug!(session = %session, "Playback finished naturally");
                self.emit(SpeechEvent::Ended { session });
            }
            Err(error) => {
                tracing::warn!(session = %session, %error, "Playback failed");
                self.emit(SpeechEvent::errored(session, &error));
            }
        }
    }

    /// Move `from → to`, dropping the player. `None` if not in `from`.
    fn transition(
        &self,
        from: PlaybackState,
        to: PlaybackState,
    ) -> Option<Option<Arc<dyn NativePlayer>>> {
        let mut slot = self.slot();
        if slot.state != from {
            return None;
        }
        slot.state = to;
        Some(slot.player.take())
    }

    fn emit(&self, event: SpeechEvent) {
        // Receiver gone means nobody is listening; playback still cleans up.
        let _ = self.inner.events.send(event);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
