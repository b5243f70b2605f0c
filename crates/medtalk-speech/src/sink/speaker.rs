//! Speaker output through `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so every playback gets
//! its own OS thread that owns the stream for exactly as long as the audio
//! lasts. The thread reports start acceptance (or the decode/device error)
//! over a oneshot, then blocks in `sleep_until_end` and reports the drain.
//! The shared `Sink` is the only thing that crosses back to async land.

use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use medtalk_core::{AudioBuffer, AudioSink, NativePlayer, SpeechError};
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;

/// Plays finalized buffers on the default output device.
#[derive(Debug, Clone)]
pub struct RodioSink {
    volume: f32,
}

impl Default for RodioSink {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

impl RodioSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output volume, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn start(
        &self,
        url: &str,
        audio: &AudioBuffer,
    ) -> Result<Arc<dyn NativePlayer>, SpeechError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let bytes = audio.bytes();
        let volume = self.volume;

        thread::Builder::new()
            .name("medtalk-playback".into())
            .spawn(move || play_on_thread(bytes, volume, ready_tx, done_tx))
            .map_err(|e| SpeechError::playback(format!("failed to spawn playback thread: {e}")))?;

        let sink = ready_rx
            .await
            .map_err(|_| SpeechError::playback("playback thread died before starting"))??;

        tracing::debug!(%url, volume, "rodio playback started");
        Ok(Arc::new(RodioPlayer {
            sink,
            done: Mutex::new(Some(done_rx)),
        }))
    }
}

fn play_on_thread(
    bytes: Bytes,
    volume: f32,
    ready_tx: oneshot::Sender<Result<Arc<Sink>, SpeechError>>,
    done_tx: oneshot::Sender<()>,
) {
    let opened = OutputStream::try_default()
        .map_err(|e| SpeechError::playback(format!("no audio output device: {e}")))
        .and_then(|(stream, handle)| {
            let sink = Sink::try_new(&handle)
                .map_err(|e| SpeechError::playback(format!("failed to open output: {e}")))?;
            let source = Decoder::new(Cursor::new(bytes))
                .map_err(|e| SpeechError::playback(format!("undecodable audio: {e}")))?;
            sink.set_volume(volume);
            sink.append(source);
            Ok((stream, Arc::new(sink)))
        });

    let (_stream, sink) = match opened {
        Ok(opened) => opened,
        Err(error) => {
            let _ = ready_tx.send(Err(error));
            return;
        }
    };

    if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
        // Nobody is waiting for this playback any more.
        sink.stop();
        return;
    }

    // Returns on drain, or immediately once pause() stops the sink.
    sink.sleep_until_end();
    let _ = done_tx.send(());
}

struct RodioPlayer {
    sink: Arc<Sink>,
    done: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl NativePlayer for RodioPlayer {
    fn pause(&self) {
        self.sink.stop();
    }

    async fn finished(&self) -> Result<(), SpeechError> {
        let done = self.done.lock().unwrap_or_else(PoisonError::into_inner).take();
        match done {
            Some(rx) => rx
                .await
                .map_err(|_| SpeechError::playback("playback thread ended unexpectedly")),
            None => Ok(()),
        }
    }
}
