//! Internal error types for API operations.
//!
//! These errors are internal to `medtalk-client` and are mapped to
//! [`SpeechError`] at the speech port boundary.

use medtalk_core::SpeechError;
use thiserror::Error;

/// Result type alias for API operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Longest error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

/// Errors related to API operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
        /// Error detail from the server (truncated)
        body: String,
    },

    /// A success status with nothing to read (204 and friends).
    #[error("Response from {url} had no body")]
    NoContent {
        /// The URL that was requested
        url: String,
    },

    /// A base address or locator could not be resolved.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// What was being resolved
        endpoint: String,
        /// Why it failed
        reason: String,
    },

    /// No response headers, or no further body chunk, within the limit.
    #[error("Timed out after {after:?} waiting for {url}")]
    Timeout {
        /// The URL that was requested
        url: String,
        /// The limit that ran out
        after: std::time::Duration,
    },

    /// Caller passed something the server would reject anyway.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Speech text was blank.
    #[error("Speech text must not be empty")]
    EmptyText,

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ClientError {
    /// Build a [`ClientError::Status`] from a raw error body.
    ///
    /// FastAPI-style `{"detail": "..."}` bodies are unwrapped to the detail.
    pub(crate) fn status(status: u16, url: impl Into<String>, raw_body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(raw_body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| raw_body.trim().to_string());

        Self::Status {
            status,
            url: url.into(),
            body: truncate(&detail, MAX_ERROR_BODY),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

impl From<ClientError> for SpeechError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, body, .. } => Self::Status { status, body },
            ClientError::NoContent { .. } => Self::MissingBody,
            ClientError::InvalidEndpoint { endpoint, reason } => Self::InvalidEndpoint {
                endpoint,
                message: reason,
            },
            ClientError::EmptyText => Self::EmptyText,
            err @ ClientError::Timeout { .. } => Self::transport(err.to_string()),
            ClientError::InvalidArgument(message) => Self::InvalidEndpoint {
                endpoint: String::new(),
                message,
            },
            ClientError::Network(e) if e.is_decode() => Self::invalid_response(e.to_string()),
            ClientError::Network(e) => Self::transport(e.to_string()),
            ClientError::JsonParse(e) => Self::invalid_response(e.to_string()),
        }
    }
}
