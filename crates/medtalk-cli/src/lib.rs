#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

// Integration-test-only dev-dependencies
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, SessionCommand};
pub use error::CliError;
pub use parser::Cli;
