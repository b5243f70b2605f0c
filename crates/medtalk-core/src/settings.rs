//! Speech client settings and validation.
//!
//! Pure domain types: loading from a file or `.env` is the binary's job.
//! Environment variables are read through an injected lookup so tests never
//! touch the process environment.

use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_LANGUAGE, DEFAULT_SPEAKER_ID};
use crate::session::DeliveryMode;

/// Default address of the chat/speech API.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable names understood by [`SpeechSettings::from_env_with`].
pub mod env_keys {
    pub const API_BASE: &str = "MEDTALK_API_BASE";
    pub const SPEAKER: &str = "MEDTALK_SPEAKER";
    pub const LANGUAGE: &str = "MEDTALK_LANGUAGE";
    pub const DELIVERY: &str = "MEDTALK_DELIVERY";
    pub const TIMEOUT_SECS: &str = "MEDTALK_TIMEOUT_SECS";
    pub const VOLUME: &str = "MEDTALK_VOLUME";
    pub const FALLBACK: &str = "MEDTALK_FALLBACK";
}

/// Speech client settings.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechSettings {
    /// Base address prefixed to relative API paths.
    pub api_base: Option<String>,

    /// Speaker persona sent with speech requests.
    pub speaker_id: Option<String>,

    /// Synthesis language sent with speech requests.
    pub language: Option<String>,

    /// Streaming or collect-then-play delivery.
    pub delivery: Option<DeliveryMode>,

    /// Per-request timeout in seconds (1-600).
    pub request_timeout_secs: Option<u64>,

    /// Output volume (0.0-1.0).
    pub volume: Option<f32>,

    /// Retry a failed stream once through the buffered endpoint.
    pub fallback_to_buffered: Option<bool>,
}

impl SpeechSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base: Some(DEFAULT_API_BASE.to_string()),
            speaker_id: Some(DEFAULT_SPEAKER_ID.to_string()),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            delivery: Some(DeliveryMode::Stream),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            volume: Some(1.0),
            fallback_to_buffered: Some(true),
        }
    }

    /// Defaults overlaid with whatever `lookup` finds for [`env_keys`].
    ///
    /// Unparseable values are logged and ignored rather than rejected, so a
    /// typo in one variable does not take the whole client down.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut update = SpeechSettingsUpdate::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty(env_keys::API_BASE) {
            update.api_base = Some(Some(base.trim().to_string()));
        }
        if let Some(speaker) = non_empty(env_keys::SPEAKER) {
            update.speaker_id = Some(Some(speaker.trim().to_string()));
        }
        if let Some(language) = non_empty(env_keys::LANGUAGE) {
            update.language = Some(Some(language.trim().to_string()));
        }
        if let Some(raw) = non_empty(env_keys::DELIVERY) {
            match raw.parse::<DeliveryMode>() {
                Ok(mode) => update.delivery = Some(Some(mode)),
                Err(e) => tracing::warn!(key = env_keys::DELIVERY, error = %e, "Ignoring setting"),
            }
        }
        if let Some(raw) = non_empty(env_keys::TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => update.request_timeout_secs = Some(Some(secs)),
                Err(e) => tracing::warn!(key = env_keys::TIMEOUT_SECS, error = %e, "Ignoring setting"),
            }
        }
        if let Some(raw) = non_empty(env_keys::VOLUME) {
            match raw.trim().parse::<f32>() {
                Ok(volume) => update.volume = Some(Some(volume)),
                Err(e) => tracing::warn!(key = env_keys::VOLUME, error = %e, "Ignoring setting"),
            }
        }
        if let Some(raw) = non_empty(env_keys::FALLBACK) {
            match parse_flag(&raw) {
                Some(flag) => update.fallback_to_buffered = Some(Some(flag)),
                None => tracing::warn!(key = env_keys::FALLBACK, value = %raw, "Ignoring setting"),
            }
        }

        let mut settings = Self::with_defaults();
        settings.merge(&update);
        settings
    }

    /// Get the effective API base (with default fallback).
    pub fn effective_api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn effective_speaker_id(&self) -> &str {
        self.speaker_id.as_deref().unwrap_or(DEFAULT_SPEAKER_ID)
    }

    pub fn effective_language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn effective_delivery(&self) -> DeliveryMode {
        self.delivery.unwrap_or_default()
    }

    pub fn effective_request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn effective_volume(&self) -> f32 {
        self.volume.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn effective_fallback(&self) -> bool {
        self.fallback_to_buffered.unwrap_or(true)
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SpeechSettingsUpdate) {
        if let Some(ref base) = other.api_base {
            self.api_base.clone_from(base);
        }
        if let Some(ref speaker) = other.speaker_id {
            self.speaker_id.clone_from(speaker);
        }
        if let Some(ref language) = other.language {
            self.language.clone_from(language);
        }
        if let Some(delivery) = other.delivery {
            self.delivery = delivery;
        }
        if let Some(timeout) = other.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(volume) = other.volume {
            self.volume = volume;
        }
        if let Some(fallback) = other.fallback_to_buffered {
            self.fallback_to_buffered = fallback;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechSettingsUpdate {
    pub api_base: Option<Option<String>>,
    pub speaker_id: Option<Option<String>>,
    pub language: Option<Option<String>>,
    pub delivery: Option<Option<DeliveryMode>>,
    pub request_timeout_secs: Option<Option<u64>>,
    pub volume: Option<Option<f32>>,
    pub fallback_to_buffered: Option<Option<bool>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("API base must be an absolute http(s) address, got '{0}'")]
    InvalidApiBase(String),

    #[error("Request timeout must be between 1 and 600 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("Speaker id cannot be empty")]
    EmptySpeaker,

    #[error("Language cannot be empty")]
    EmptyLanguage,
}

/// Validate settings values.
pub fn validate_settings(settings: &SpeechSettings) -> Result<(), SettingsError> {
    if let Some(ref base) = settings.api_base {
        let trimmed = base.trim();
        let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
        let has_host = trimmed
            .split_once("://")
            .is_some_and(|(_, rest)| !rest.trim_start_matches('/').is_empty());
        if !has_scheme || !has_host {
            return Err(SettingsError::InvalidApiBase(base.clone()));
        }
    }

    if let Some(secs) = settings.request_timeout_secs {
        if !(1..=600).contains(&secs) {
            return Err(SettingsError::InvalidTimeout(secs));
        }
    }

    if let Some(volume) = settings.volume {
        if !(0.0..=1.0).contains(&volume) {
            return Err(SettingsError::InvalidVolume(volume));
        }
    }

    if settings
        .speaker_id
        .as_ref()
        .is_some_and(|s| s.trim().is_empty())
    {
        return Err(SettingsError::EmptySpeaker);
    }

    if settings
        .language
        .as_ref()
        .is_some_and(|l| l.trim().is_empty())
    {
        return Err(SettingsError::EmptyLanguage);
    }

    Ok(())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
