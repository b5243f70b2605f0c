//! Scripted doubles for the speech transport and audio sink.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use medtalk_core::{
    AudioBuffer, AudioSink, AudioStream, NativePlayer, SessionId, SessionState, SpeechError,
    SpeechEvent, SpeechRequest, SpeechResponse, SpeechTransport,
};
use medtalk_speech::{PlaybackAdapter, SpeakerConfig, SpeakerController};
use tokio::sync::{mpsc, watch};

// ── Transport ──────────────────────────────────────────────────────

/// One step of a scripted response body.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(Bytes),
    Fail(SpeechError),
    /// Never yields again; only cancellation gets past this.
    Hang,
}

pub fn chunk(bytes: &[u8]) -> Step {
    Step::Chunk(Bytes::copy_from_slice(bytes))
}

/// What the next `open_stream` / `fetch_audio` call does.
#[derive(Debug, Clone)]
pub enum Script {
    Body(Vec<Step>),
    Reject(SpeechError),
    /// Headers never arrive.
    HangOnOpen,
}

/// Decrements the live-stream counter when the body stream is dropped.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    streams: Mutex<VecDeque<Script>>,
    synth: Mutex<VecDeque<Result<SpeechResponse, SpeechError>>>,
    audio: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<SpeechRequest>>,
    fetched: Mutex<Vec<String>>,
    live_streams: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_stream(&self, script: Script) {
        self.streams.lock().unwrap().push_back(script);
    }

    pub fn push_synthesis(&self, response: Result<SpeechResponse, SpeechError>) {
        self.synth.lock().unwrap().push_back(response);
    }

    pub fn serve_audio(&self, locator: &str, script: Script) {
        self.audio.lock().unwrap().insert(locator.to_string(), script);
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Body streams handed out and not yet dropped.
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    async fn open(&self, script: Script) -> Result<AudioStream, SpeechError> {
        match script {
            Script::Reject(error) => Err(error),
            Script::HangOnOpen => std::future::pending().await,
            Script::Body(steps) => {
                self.live_streams.fetch_add(1, Ordering::SeqCst);
                let guard = LiveGuard(Arc::clone(&self.live_streams));
                let stream = futures_util::stream::unfold(
                    (steps.into_iter(), guard),
                    |(mut steps, guard)| async move {
                        match steps.next()? {
                            Step::Chunk(bytes) => Some((Ok(bytes), (steps, guard))),
                            Step::Fail(error) => Some((Err(error), (steps, guard))),
                            Step::Hang => {
                                std::future::pending::<()>().await;
                                None
                            }
                        }
                    },
                );
                Ok(stream.boxed())
            }
        }
    }
}

#[async_trait]
impl SpeechTransport for ScriptedTransport {
    async fn open_stream(&self, request: &SpeechRequest) -> Result<AudioStream, SpeechError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Body(Vec::new()));
        self.open(script).await
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        self.requests.lock().unwrap().push(request.clone());
        self.synth
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SpeechError::transport("no synthesis scripted")))
    }

    async fn fetch_audio(&self, locator: &str) -> Result<AudioStream, SpeechError> {
        self.fetched.lock().unwrap().push(locator.to_string());
        let script = self
            .audio
            .lock()
            .unwrap()
            .remove(locator)
            .unwrap_or_else(|| Script::Reject(SpeechError::Status {
                status: 404,
                body: "Not Found".into(),
            }));
        self.open(script).await
    }
}

// ── Sink ───────────────────────────────────────────────────────────

/// A player the test finishes by hand.
pub struct FakePlayer {
    paused: AtomicBool,
    outcome: watch::Sender<Option<Result<(), SpeechError>>>,
}

impl FakePlayer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            paused: AtomicBool::new(false),
            outcome: watch::channel(None).0,
        })
    }

    /// Simulate the output draining.
    pub fn drain(&self) {
        self.outcome.send_replace(Some(Ok(())));
    }

    /// Simulate a failure mid-play.
    pub fn fail(&self, message: &str) {
        self.outcome
            .send_replace(Some(Err(SpeechError::playback(message))));
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativePlayer for FakePlayer {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.outcome.send_if_modified(|outcome| {
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(Ok(()));
            true
        });
    }

    async fn finished(&self) -> Result<(), SpeechError> {
        let mut rx = self.outcome.subscribe();
        let outcome = rx.wait_for(Option::is_some).await.map(|v| (*v).clone());
        outcome.ok().flatten().unwrap_or(Ok(()))
    }
}

/// How [`RecordingSink`] treats the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Player stays audible until the test drains or fails it.
    Manual,
    /// Player drains immediately.
    AutoDrain,
    /// Start is rejected as undecodable.
    Reject,
}

/// Records every buffer it is asked to play.
pub struct RecordingSink {
    mode: Mutex<SinkMode>,
    start_delay: Mutex<Option<Duration>>,
    played: Mutex<Vec<(String, Vec<u8>)>>,
    players: Mutex<Vec<Arc<FakePlayer>>>,
}

impl RecordingSink {
    pub fn new(mode: SinkMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            start_delay: Mutex::new(None),
            played: Mutex::new(Vec::new()),
            players: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: SinkMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Take this long to accept or reject each start, like a decoder
    /// running on its own thread.
    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = Some(delay);
    }

    /// `(url, bytes)` for every accepted or rejected start, in order.
    pub fn played(&self) -> Vec<(String, Vec<u8>)> {
        self.played.lock().unwrap().clone()
    }

    pub fn player(&self, index: usize) -> Arc<FakePlayer> {
        Arc::clone(&self.players.lock().unwrap()[index])
    }

    pub fn player_count(&self) -> usize {
        self.players.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn start(
        &self,
        url: &str,
        audio: &AudioBuffer,
    ) -> Result<Arc<dyn NativePlayer>, SpeechError> {
        self.played
            .lock()
            .unwrap()
            .push((url.to_string(), audio.as_bytes().to_vec()));

        let delay = *self.start_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mode = *self.mode.lock().unwrap();
        if mode == SinkMode::Reject {
            return Err(SpeechError::playback("undecodable audio"));
        }

        let player = FakePlayer::new();
        if mode == SinkMode::AutoDrain {
            player.drain();
        }
        self.players.lock().unwrap().push(Arc::clone(&player));
        Ok(player as Arc<dyn NativePlayer>)
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub controller: SpeakerController,
    pub events: mpsc::UnboundedReceiver<SpeechEvent>,
    pub transport: Arc<ScriptedTransport>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(mode: SinkMode) -> Self {
        Self::with_config(mode, SpeakerConfig::default())
    }

    pub fn with_config(mode: SinkMode, config: SpeakerConfig) -> Self {
        let transport = ScriptedTransport::new();
        let sink = RecordingSink::new(mode);
        let playback = PlaybackAdapter::new(Arc::clone(&sink) as Arc<dyn AudioSink>);
        let (controller, events) = SpeakerController::new(
            config,
            Arc::clone(&transport) as Arc<dyn SpeechTransport>,
            playback,
        );
        Self {
            controller,
            events,
            transport,
            sink,
        }
    }

    /// Next event, failing the test after five seconds.
    pub async fn next_event(&mut self) -> SpeechEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for a speech event")
            .expect("speech event channel closed")
    }

    /// Events up to and including the first final event of `session`.
    pub async fn events_until_final(&mut self, session: SessionId) -> Vec<SpeechEvent> {
        let mut seen = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = event.session() == session && event.is_final();
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    /// Everything already queued on the channel.
    pub fn drain_events(&mut self) -> Vec<SpeechEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }

    /// Wait until the sink has been asked to start `count` times.
    pub async fn wait_for_starts(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.sink.played().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for the sink");
    }

    /// Wait until `count` players have been started.
    pub async fn wait_for_players(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.sink.player_count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for playback to start");
    }
}

/// The sequence of states reported for `session`.
pub fn states_of(events: &[SpeechEvent], session: SessionId) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|e| match e {
            SpeechEvent::StateChanged { session: s, state } if *s == session => Some(*state),
            _ => None,
        })
        .collect()
}

/// Whether any event for `session` is an error.
pub fn has_error(events: &[SpeechEvent], session: SessionId) -> bool {
    events
        .iter()
        .any(|e| matches!(e, SpeechEvent::Errored { session: s, .. } if *s == session))
}

/// Let spawned tasks run for a moment.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
