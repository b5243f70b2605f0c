//! Capture sink: "plays" audio by writing it to a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use medtalk_core::{AudioBuffer, AudioSink, NativePlayer, SpeechError};

/// Writes each buffer it is asked to play to a fixed path.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn start(
        &self,
        url: &str,
        audio: &AudioBuffer,
    ) -> Result<Arc<dyn NativePlayer>, SpeechError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SpeechError::playback(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&self.path, audio.as_bytes())
            .await
            .map_err(|e| {
                SpeechError::playback(format!("cannot write {}: {e}", self.path.display()))
            })?;

        tracing::info!(
            path = %self.path.display(),
            bytes = audio.len(),
            %url,
            "Audio written"
        );
        Ok(Arc::new(WrittenFile))
    }
}

/// A player whose output is already complete.
struct WrittenFile;

#[async_trait]
impl NativePlayer for WrittenFile {
    fn pause(&self) {}

    async fn finished(&self) -> Result<(), SpeechError> {
        Ok(())
    }
}
