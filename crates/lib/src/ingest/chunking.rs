//! # Text Chunking
//!
//! Splits extracted text into fixed-size windows that overlap their neighbour,
//! ready to be embedded one by one.
//!
//! Sizes are measured in characters (Unicode scalar values), never bytes, so a
//! window can never cut a multi-byte character in half. For an input of length
//! `L` and a policy of `size`/`overlap`:
//!
//! - `L == 0` yields no chunks,
//! - `L <= size` yields a single chunk holding the whole text,
//! - otherwise there are `ceil((L - overlap) / (size - overlap))` chunks and
//!   each chunk shares exactly `overlap` characters with the next one. Only the
//!   final chunk may be shorter than `size`.

use serde::Serialize;
use thiserror::Error;

/// The default maximum size for a single text chunk in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// The default character overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// A window of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Position of the chunk in the sequence, starting at 0.
    pub index: usize,
    pub content: String,
    /// Character offset of the first character of the chunk in the source text.
    pub char_offset: usize,
}

/// Fixed-window chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingPolicy {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// How many chunks [`ChunkingPolicy::split`] produces for a text of `len` characters.
    pub fn expected_chunk_count(&self, len: usize) -> usize {
        match len {
            0 => 0,
            l if l <= self.chunk_size => 1,
            l => {
                let stride = self.chunk_size - self.chunk_overlap;
                (l - self.chunk_overlap).div_ceil(stride)
            }
        }
    }

    /// Splits `text` into overlapping windows.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::with_capacity(self.expected_chunk_count(chars.len()));
        let mut start = 0;

        while start < chars.len() {
            let end = std::cmp::min(start + self.chunk_size, chars.len());
            chunks.push(TextChunk {
                index: chunks.len(),
                content: chars[start..end].iter().collect(),
                char_offset: start,
            });

            if end == chars.len() {
                break;
            }
            start = end - self.chunk_overlap;
        }

        chunks
    }
}
