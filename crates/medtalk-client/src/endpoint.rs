//! Base-address resolution.
//!
//! Every request path goes through [`ApiEndpoint::resolve`]: relative paths
//! are joined onto the current base, absolute `http(s)` URLs are used as-is
//! (the buffered speech endpoint hands back absolute audio locators).

use std::sync::{PoisonError, RwLock};

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Runtime-overridable base address.
#[derive(Debug)]
pub struct ApiEndpoint {
    base: RwLock<String>,
}

impl ApiEndpoint {
    /// Create an endpoint rooted at `base`.
    pub fn new(base: impl Into<String>) -> ClientResult<Self> {
        let base = normalize_base(&base.into())?;
        Ok(Self {
            base: RwLock::new(base),
        })
    }

    /// Current base address, without a trailing slash.
    pub fn base(&self) -> String {
        self.base
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the base used by every later request.
    pub fn set_base(&self, base: &str) -> ClientResult<()> {
        let normalized = normalize_base(base)?;
        tracing::info!(base = %normalized, "API base updated");
        *self.base.write().unwrap_or_else(PoisonError::into_inner) = normalized;
        Ok(())
    }

    /// Turn `path_or_url` into an absolute URL.
    pub fn resolve(&self, path_or_url: &str) -> ClientResult<Url> {
        let candidate = path_or_url.trim();
        if candidate.is_empty() {
            return Err(ClientError::InvalidEndpoint {
                endpoint: path_or_url.to_string(),
                reason: "empty path".to_string(),
            });
        }

        if let Ok(url) = Url::parse(candidate) {
            if is_http(&url) {
                return Ok(url);
            }
            if url.has_host() || candidate.contains("://") {
                return Err(ClientError::InvalidEndpoint {
                    endpoint: candidate.to_string(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }

        let joined = format!("{}/{}", self.base(), candidate.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: joined.clone(),
            reason: e.to_string(),
        })
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.has_host()
}

fn normalize_base(base: &str) -> ClientResult<String> {
    let trimmed = base.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| ClientError::InvalidEndpoint {
        endpoint: base.to_string(),
        reason: e.to_string(),
    })?;
    if !is_http(&parsed) {
        return Err(ClientError::InvalidEndpoint {
            endpoint: base.to_string(),
            reason: "base must be an absolute http(s) address".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
