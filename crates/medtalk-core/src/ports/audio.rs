//! Audio output port.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::session::AudioBuffer;

/// One live native playback object.
///
/// Owned by exactly one playback handle. After [`pause`](Self::pause) the
/// player must not report natural completion.
#[async_trait]
pub trait NativePlayer: Send + Sync {
    /// Halt output immediately. Safe to call repeatedly.
    fn pause(&self);

    /// Resolve when output drains (`Ok`) or fails mid-play (`Err`).
    ///
    /// Also resolves after [`pause`](Self::pause); callers distinguish that
    /// case themselves.
    async fn finished(&self) -> Result<(), SpeechError>;
}

/// Something that can turn an encoded buffer into sound.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Begin playing `audio`, addressed by the transient `url` that the
    /// caller owns for the lifetime of the returned player.
    ///
    /// Resolves once the output has accepted the buffer and begun playing,
    /// or with an error when it rejects the buffer up front (undecodable
    /// data, no device).
    async fn start(
        &self,
        url: &str,
        audio: &AudioBuffer,
    ) -> Result<Arc<dyn NativePlayer>, SpeechError>;
}
