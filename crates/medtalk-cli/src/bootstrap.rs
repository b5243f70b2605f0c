//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI:
//! - Settings (environment, then command-line overrides, then validation)
//! - The HTTP API client (via medtalk-client)
//! - Speaker controllers and their audio sinks (via medtalk-speech)
//!
//! Command handlers receive the composed [`CliContext`] and never build
//! clients or sinks themselves.

use std::path::Path;
use std::sync::Arc;

use medtalk_client::{ApiClient, ClientConfig};
use medtalk_core::{
    AudioSink, DeliveryMode, SpeechEvent, SpeechSettings, SpeechSettingsUpdate, SpeechTransport,
    validate_settings,
};
use medtalk_speech::{FileSink, PlaybackAdapter, SpeakerConfig, SpeakerController};
use tokio::sync::mpsc;

use crate::error::CliError;

/// Label for the controller the CLI speaks through.
const CLI_SPEAKER: &str = "cli";

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Resolved settings, defaults included.
    pub settings: SpeechSettings,
}

impl CliConfig {
    /// Settings from the `MEDTALK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            settings: SpeechSettings::from_env_with(lookup),
        }
    }

    /// Override the API base when one was given on the command line.
    #[must_use]
    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        if let Some(base) = api_base {
            self.settings.merge(&SpeechSettingsUpdate {
                api_base: Some(Some(base.trim().to_string())),
                ..SpeechSettingsUpdate::default()
            });
        }
        self
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// Validated settings.
    pub settings: SpeechSettings,
    /// Client for every API call, speech included.
    pub client: Arc<ApiClient>,
}

impl CliContext {
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Where synthesized audio goes: `out` when given, else the speakers.
    pub fn audio_sink(&self, out: Option<&Path>) -> Result<Arc<dyn AudioSink>, CliError> {
        if let Some(path) = out {
            return Ok(Arc::new(FileSink::new(path)));
        }

        #[cfg(feature = "native-audio")]
        {
            Ok(Arc::new(
                medtalk_speech::RodioSink::new().with_volume(self.settings.effective_volume()),
            ))
        }

        #[cfg(not(feature = "native-audio"))]
        {
            Err(CliError::Arguments(
                "no audio output available; pass --out FILE or build with the native-audio feature"
                    .to_string(),
            ))
        }
    }

    /// A speaker controller over the shared client.
    pub fn speaker(
        &self,
        out: Option<&Path>,
        delivery: DeliveryMode,
    ) -> Result<(SpeakerController, mpsc::UnboundedReceiver<SpeechEvent>), CliError> {
        let sink = self.audio_sink(out)?;
        let config = SpeakerConfig {
            delivery,
            ..SpeakerConfig::from_settings(CLI_SPEAKER, &self.settings)
        };
        let transport = Arc::clone(&self.client) as Arc<dyn SpeechTransport>;
        Ok(SpeakerController::new(
            config,
            transport,
            PlaybackAdapter::new(sink),
        ))
    }
}

/// Validate settings and build the context.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    validate_settings(&config.settings)?;

    let client = ApiClient::new(&ClientConfig::from_settings(&config.settings))?;
    tracing::debug!(
        api_base = config.settings.effective_api_base(),
        delivery = %config.settings.effective_delivery(),
        "CLI context ready"
    );

    Ok(CliContext {
        settings: config.settings,
        client: Arc::new(client),
    })
}
