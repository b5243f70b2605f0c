//! Transient playable resource identifiers.
//!
//! A finalized buffer is published under a short-lived `blob:` URL for the
//! duration of its playback, the way a browser object URL would be. The
//! [`BlobUrl`] guard revokes the URL exactly once: on the first explicit
//! [`release`](BlobUrl::release), or on drop if nobody released it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use medtalk_core::AudioBuffer;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:medtalk/";

#[derive(Debug, Default)]
struct RegistryInner {
    live: Mutex<HashMap<String, AudioBuffer>>,
    created: AtomicUsize,
    revoked: AtomicUsize,
}

/// In-process table of live blob URLs.
///
/// Cloning is cheap; all clones share one table.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    inner: Arc<RegistryInner>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `audio` under a fresh URL.
    pub fn create(&self, audio: &AudioBuffer) -> BlobUrl {
        let url = format!("{URL_PREFIX}{}", Uuid::new_v4());
        self.live().insert(url.clone(), audio.clone());
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(%url, bytes = audio.len(), "Blob URL created");

        BlobUrl {
            url,
            registry: self.clone(),
            released: AtomicBool::new(false),
        }
    }

    /// The buffer behind `url`, while it is live.
    pub fn resolve(&self, url: &str) -> Option<AudioBuffer> {
        self.live().get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.live().contains_key(url)
    }

    /// Number of URLs currently live.
    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    /// Total URLs ever created.
    pub fn created_count(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    /// Total URLs ever revoked.
    pub fn revoked_count(&self) -> usize {
        self.inner.revoked.load(Ordering::SeqCst)
    }

    fn revoke(&self, url: &str) -> bool {
        let removed = self.live().remove(url).is_some();
        if removed {
            self.inner.revoked.fetch_add(1, Ordering::SeqCst);
            tracing::trace!(%url, "Blob URL revoked");
        }
        removed
    }

    fn live(&self) -> std::sync::MutexGuard<'_, HashMap<String, AudioBuffer>> {
        self.inner.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of one live blob URL.
#[derive(Debug)]
pub struct BlobUrl {
    url: String,
    registry: BlobRegistry,
    released: AtomicBool,
}

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Revoke the URL. Returns `true` only for the call that actually
    /// released it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.registry.revoke(&self.url)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for BlobUrl {
    fn drop(&mut self) {
        self.release();
    }
}
