//! Client for the chat/speech API.
//!
//! One `reqwest::Client` is shared by every call; the base address lives in
//! an [`ApiEndpoint`] so it can be swapped without rebuilding the client.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use medtalk_core::{
    AudioStream, ChatRequest, ChatResponse, ClinicianConfig, HealthStatus, HistoryResponse,
    SessionResponse, SpeechError, SpeechRequest, SpeechResponse, SpeechTransport,
};

use crate::config::ClientConfig;
use crate::endpoint::ApiEndpoint;
use crate::error::{ClientError, ClientResult};

/// API paths, relative to the base address.
pub(crate) mod paths {
    pub const CHAT: &str = "/api/chat";
    pub const SESSIONS: &str = "/api/chat/sessions";
    pub const HISTORY: &str = "/api/chat/history";
    pub const HEALTH: &str = "/api/health";
    pub const CONFIG: &str = "/api/config";
    pub const SPEECH: &str = "/api/speech";
    pub const SPEECH_STREAM: &str = "/api/speech/stream";
}

/// HTTP client for the remote chat/speech API.
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: ApiEndpoint,
    timeout: Duration,
    idle_timeout: Duration,
}

impl ApiClient {
    /// Build a client from `config`.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        // No client-wide timeout: it would also cap streamed bodies.
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: ApiEndpoint::new(config.base_url.clone())?,
            timeout: config.timeout,
            idle_timeout: config.idle_timeout,
        })
    }

    /// The base-address holder; use it to override the base at runtime.
    pub const fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    // ── Chat helpers ───────────────────────────────────────────────

    /// `POST /api/chat`: send a message, get the assistant's reply.
    pub async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatResponse> {
        if request.message.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "chat message must not be empty".to_string(),
            ));
        }
        self.post_json(paths::CHAT, request).await
    }

    /// `POST /api/chat/sessions`: allocate a new conversation.
    pub async fn create_session(&self) -> ClientResult<SessionResponse> {
        let url = self.endpoint.resolve(paths::SESSIONS)?;
        let response = self.json_call(self.http.post(url.clone())).await?;
        read_json(response, &url).await
    }

    /// `GET /api/chat/history`: stored turns of a conversation.
    pub async fn history(&self, session_id: &str) -> ClientResult<HistoryResponse> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ClientError::InvalidArgument(
                "session_id required".to_string(),
            ));
        }
        let url = self.endpoint.resolve(paths::HISTORY)?;
        let response = self
            .json_call(self.http.get(url.clone()).query(&[("session_id", session_id)]))
            .await?;
        read_json(response, &url).await
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.get_json(paths::HEALTH).await
    }

    /// `GET /api/config`: avatar identity.
    pub async fn clinician(&self) -> ClientResult<ClinicianConfig> {
        self.get_json(paths::CONFIG).await
    }

    // ── Speech ─────────────────────────────────────────────────────

    /// `POST /api/speech/stream`, resolved once headers arrive.
    pub async fn speech_stream(&self, request: &SpeechRequest) -> ClientResult<AudioStream> {
        if request.is_blank() {
            return Err(ClientError::EmptyText);
        }
        let url = self.endpoint.resolve(paths::SPEECH_STREAM)?;
        tracing::debug!(%url, chars = request.text.len(), "Opening speech stream");
        let response = self
            .until_headers(self.http.post(url.clone()).json(request).send(), &url)
            .await?;
        into_audio_stream(response, &url, self.idle_timeout).await
    }

    /// `POST /api/speech`: buffered synthesis.
    pub async fn speech(&self, request: &SpeechRequest) -> ClientResult<SpeechResponse> {
        if request.is_blank() {
            return Err(ClientError::EmptyText);
        }
        self.post_json(paths::SPEECH, request).await
    }

    /// `GET <locator>`: download synthesised audio as a byte stream.
    pub async fn audio(&self, locator: &str) -> ClientResult<AudioStream> {
        let url = self.endpoint.resolve(locator)?;
        tracing::debug!(%url, "Fetching synthesised audio");
        let response = self
            .until_headers(self.http.get(url.clone()).send(), &url)
            .await?;
        into_audio_stream(response, &url, self.idle_timeout).await
    }

    // ── Plumbing ───────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint.resolve(path)?;
        let response = self.json_call(self.http.get(url.clone())).await?;
        read_json(response, &url).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint.resolve(path)?;
        let response = self.json_call(self.http.post(url.clone()).json(body)).await?;
        read_json(response, &url).await
    }

    /// Send a JSON call; the timeout covers its whole (small) body.
    async fn json_call(&self, request: RequestBuilder) -> ClientResult<Response> {
        Ok(request.timeout(self.timeout).send().await?)
    }

    /// Wait for response headers only; the body is read later, chunk by chunk.
    async fn until_headers<F>(&self, send: F, url: &Url) -> ClientResult<Response>
    where
        F: Future<Output = reqwest::Result<Response>>,
    {
        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| ClientError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            })?
            .map_err(ClientError::from)
    }
}

/// Fail on non-success, otherwise hand the response back.
async fn check_status(response: Response, url: &Url) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%url, status = status.as_u16(), "API request failed");
    Err(ClientError::status(status.as_u16(), url.as_str(), &body))
}

async fn read_json<T: DeserializeOwned>(response: Response, url: &Url) -> ClientResult<T> {
    let response = check_status(response, url).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn into_audio_stream(
    response: Response,
    url: &Url,
    idle_timeout: Duration,
) -> ClientResult<AudioStream> {
    let response = check_status(response, url).await?;
    if response.status() == StatusCode::NO_CONTENT {
        return Err(ClientError::NoContent {
            url: url.to_string(),
        });
    }

    Ok(with_idle_timeout(response.bytes_stream(), url.clone(), idle_timeout))
}

/// Map body chunks to [`AudioStream`] items, failing when the gap before the
/// next chunk exceeds `idle`. The stream ends after its first error.
fn with_idle_timeout<S>(body: S, url: Url, idle: Duration) -> AudioStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    futures_util::stream::unfold(Some(body.boxed()), move |body| {
        let url = url.clone();
        async move {
            let mut body = body?;
            match tokio::time::timeout(idle, body.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
                Ok(Some(Err(e))) => Some((
                    Err(SpeechError::transport(format!("body read failed: {e}"))),
                    None,
                )),
                Ok(None) => None,
                Err(_) => {
                    tracing::warn!(%url, idle_ms = idle.as_millis(), "Audio stream stalled");
                    let err = ClientError::Timeout {
                        url: url.to_string(),
                        after: idle,
                    };
                    Some((Err(SpeechError::from(err)), None))
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl SpeechTransport for ApiClient {
    async fn open_stream(&self, request: &SpeechRequest) -> Result<AudioStream, SpeechError> {
        Ok(self.speech_stream(request).await?)
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        Ok(self.speech(request).await?)
    }

    async fn fetch_audio(&self, locator: &str) -> Result<AudioStream, SpeechError> {
        Ok(self.audio(locator).await?)
    }
}
