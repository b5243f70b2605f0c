#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod api;
pub mod error;
pub mod events;
pub mod ports;
pub mod session;
pub mod settings;

// Re-export commonly used types for convenience
pub use api::{
    ChatRequest, ChatResponse, ClinicianConfig, DEFAULT_LANGUAGE, DEFAULT_SPEAKER_ID,
    HealthStatus, HistoryResponse, MessageItem, SessionResponse, SpeechRequest, SpeechResponse,
};
pub use error::{SpeechError, SpeechErrorKind};
pub use events::SpeechEvent;
pub use ports::{AudioSink, AudioStream, NativePlayer, SpeechTransport};
pub use session::{AudioBuffer, DeliveryMode, PlaybackState, SessionId, SessionState};
pub use settings::{
    DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS, SettingsError, SpeechSettings,
    SpeechSettingsUpdate, validate_settings,
};

