//! Ordered buffering of response body chunks.
//!
//! The accumulator is format-agnostic: it never looks inside the bytes it
//! holds. Chunks are kept as cheap [`Bytes`] handles and only copied once,
//! when [`ChunkAccumulator::finalize`] joins them.

use bytes::{Bytes, BytesMut};
use medtalk_core::AudioBuffer;

/// Result of [`ChunkAccumulator::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// No bytes arrived; there is nothing to play.
    Empty,
    /// All chunks joined in append order.
    Audio(AudioBuffer),
}

impl Finalized {
    /// The joined buffer, if any.
    pub fn into_audio(self) -> Option<AudioBuffer> {
        match self {
            Self::Empty => None,
            Self::Audio(audio) => Some(audio),
        }
    }
}

/// Buffers body chunks in arrival order until the stream ends.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    chunks: Vec<Bytes>,
    total: usize,
}

impl ChunkAccumulator {
    pub const fn new() -> Self {
        Self {
            chunks: Vec::new(),
            total: 0,
        }
    }

    /// Append `chunk` to the tail and return the running byte total.
    pub fn append(&mut self, chunk: Bytes) -> usize {
        self.total += chunk.len();
        self.chunks.push(chunk);
        self.total
    }

    /// Number of chunks appended so far, including empty ones.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes appended so far.
    pub const fn total_bytes(&self) -> usize {
        self.total
    }

    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Drop everything buffered so far.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total = 0;
    }

    /// Join all chunks into one contiguous buffer.
    pub fn finalize(self) -> Finalized {
        if self.total == 0 {
            return Finalized::Empty;
        }

        let joined = match self.chunks.iter().filter(|c| !c.is_empty()).count() {
            // A single non-empty chunk is already contiguous.
            1 => self
                .chunks
                .into_iter()
                .find(|c| !c.is_empty())
                .unwrap_or_default(),
            _ => {
                let mut buf = BytesMut::with_capacity(self.total);
                for chunk in &self.chunks {
                    buf.extend_from_slice(chunk);
                }
                buf.freeze()
            }
        };

        AudioBuffer::new(joined).map_or(Finalized::Empty, Finalized::Audio)
    }
}
