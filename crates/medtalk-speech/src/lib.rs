#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod accumulator;
pub mod controller;
pub mod playback;
pub mod resources;
pub mod sink;
pub mod tracker;

pub use accumulator::{ChunkAccumulator, Finalized};
pub use controller::{SessionTicket, SpeakerConfig, SpeakerController};
pub use playback::{PlaybackAdapter, PlaybackHandle};
pub use resources::{BlobRegistry, BlobUrl};
#[cfg(feature = "native-audio")]
pub use sink::RodioSink;
pub use sink::FileSink;
pub use tracker::{SpeakOutcome, SpeakingTracker, wait_for_outcome};
