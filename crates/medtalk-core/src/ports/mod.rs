//! Port definitions - the seams between the speech core and the outside world.
//!
//! # Design Rules
//!
//! - Ports speak only core types (`SpeechRequest`, `AudioBuffer`, `SpeechError`).
//! - No reqwest, rodio, or channel types leak through a port.
//! - Every port is object-safe so the composition root can hand out
//!   `Arc<dyn …>` and tests can substitute scripted doubles.

mod audio;
mod transport;

pub use audio::{AudioSink, NativePlayer};
pub use transport::{AudioStream, SpeechTransport};
