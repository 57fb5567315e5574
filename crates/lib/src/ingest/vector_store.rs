//! # In-Memory Vector Store
//!
//! Holds the embedded chunks of one document and answers nearest-neighbour
//! queries by cosine similarity. Nothing is persisted.

use crate::ingest::chunking::TextChunk;
use serde::Serialize;

/// A chunk paired with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingEntry {
    pub chunk: TextChunk,
    pub vector: Vec<f32>,
}

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: TextChunk,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryVectorStore {
    entries: Vec<EmbeddingEntry>,
}

/// Cosine similarity of two vectors. Mismatched lengths or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, chunk: TextChunk, vector: Vec<f32>) {
        self.entries.push(EmbeddingEntry { chunk, vector });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EmbeddingEntry] {
        &self.entries
    }

    /// Returns up to `k` chunks ordered from most to least similar to `query`.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}
