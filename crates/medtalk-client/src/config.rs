//! Public configuration for the API client.

use std::time::Duration;

use medtalk_core::{DEFAULT_API_BASE, SpeechSettings};

/// Configuration for [`ApiClient`](crate::ApiClient).
///
/// # Example
///
/// ```
/// use medtalk_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_base_url("https://speech.example.org")
///     .with_timeout(Duration::from_secs(20));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address relative paths are joined onto.
    pub(crate) base_url: String,
    /// User agent string for HTTP requests.
    pub(crate) user_agent: String,
    /// Time allowed until response headers arrive. JSON calls also read
    /// their (small) body within it.
    pub(crate) timeout: Duration,
    /// Longest gap allowed between two chunks of a streamed audio body.
    pub(crate) idle_timeout: Duration,
    /// TCP/TLS connect timeout.
    pub(crate) connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            user_agent: concat!("medtalk-client/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a configuration from validated speech settings.
    #[must_use]
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self::new()
            .with_base_url(settings.effective_api_base())
            .with_timeout(Duration::from_secs(
                settings.effective_request_timeout_secs(),
            ))
    }

    /// Set the base address. Defaults to `http://127.0.0.1:8000`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout. Defaults to 60 seconds.
    ///
    /// Streamed audio bodies are not bound by it: they may run as long as
    /// chunks keep arriving within the idle timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-chunk idle timeout for streamed audio. Defaults to 30
    /// seconds.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
