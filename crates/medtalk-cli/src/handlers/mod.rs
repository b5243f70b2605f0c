#![doc = include_str!("README.md")]

//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Validate CLI-specific input
//!   2. Call the API client or a speaker controller from the context
//!   3. Format output for the terminal
//!
//! Handlers should NOT build clients, sinks or controllers themselves.

pub mod chat;
pub mod clinician;
pub mod health;
pub mod history;
pub mod session;
pub mod speak;
