//! Speech transport port.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::api::{SpeechRequest, SpeechResponse};
use crate::error::SpeechError;

/// Incrementally-delivered audio body, chunks in network order.
///
/// A stream item error means the body broke off mid-way; a clean end of
/// stream means the server finished.
pub type AudioStream = BoxStream<'static, Result<Bytes, SpeechError>>;

/// Access to the remote speech API.
///
/// Implementations must not retry on their own: the controller decides
/// what a failure means. Dropping a returned [`AudioStream`] must abort the
/// underlying request.
#[async_trait]
pub trait SpeechTransport: Send + Sync {
    /// `POST /api/speech/stream`: resolve once response headers arrive.
    ///
    /// Non-success statuses map to [`SpeechError::Status`].
    async fn open_stream(&self, request: &SpeechRequest) -> Result<AudioStream, SpeechError>;

    /// `POST /api/speech`: synthesise fully server-side and return a locator.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse, SpeechError>;

    /// Download a previously synthesised audio resource.
    ///
    /// `locator` may be absolute or relative to the configured base.
    async fn fetch_audio(&self, locator: &str) -> Result<AudioStream, SpeechError>;
}
