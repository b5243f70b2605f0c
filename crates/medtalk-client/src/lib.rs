#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod client;
mod config;
mod endpoint;
mod error;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::ApiClient;

// Configuration
pub use config::ClientConfig;
pub use endpoint::ApiEndpoint;

// Errors
pub use error::{ClientError, ClientResult};

// Only exercised by the in-process server tests under tests/
#[cfg(test)]
use axum as _;
