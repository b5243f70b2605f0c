//! [`AudioSink`](medtalk_core::AudioSink) implementations.
//!
//! - [`FileSink`] writes the finalized buffer to disk and reports completion
//!   at once. Always available.
//! - `RodioSink` plays through the default output device. Requires the
//!   `native-audio` feature.

mod file;
#[cfg(feature = "native-audio")]
mod speaker;

pub use file::FileSink;
#[cfg(feature = "native-audio")]
pub use speaker::RodioSink;
