//! Wire DTOs for the remote chat/speech API.
//!
//! Field names match the server's JSON exactly (snake_case). Optional
//! request fields are omitted rather than sent as `null`.

use serde::{Deserialize, Serialize};

/// Default speaker persona understood by the speech endpoints.
pub const DEFAULT_SPEAKER_ID: &str = "dr_tewari";

/// Default synthesis language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Body of `POST /api/speech` and `POST /api/speech/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Which assistant turn the audio belongs to (buffered endpoint only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<u32>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            speaker_id: None,
            language: None,
            turn_index: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    #[must_use]
    pub fn with_speaker(mut self, speaker_id: Option<String>) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Whether the text is blank once surrounding whitespace is removed.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Response of `POST /api/speech`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub session_id: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub voice_used: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub message: Option<String>,
    pub session_id: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub voice_used: bool,
}

/// Response of `POST /api/chat/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// One turn of a stored conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageItem {
    pub role: String,
    pub content: String,
}

/// Response of `GET /api/chat/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<MessageItem>,
}

/// Response of `GET /api/health`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub gemini_api_key_loaded: Option<bool>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub audio_dir_writable: Option<bool>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Response of `GET /api/config`: who the avatar is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicianConfig {
    pub clinician_name: String,
    pub clinician_title: String,
    pub avatar_image_url: String,
}
