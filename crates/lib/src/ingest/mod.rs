//! # Ingestion Logic
//!
//! This module provides the shared ingestion contract used by source plugins
//! (such as the PDF prescription ingestor) and the optional indexing stage that
//! turns extracted text into a searchable in-memory vector store.

pub mod chunking;
pub mod indexing;
pub mod traits;
pub mod vector_store;

pub use chunking::{ChunkingError, ChunkingPolicy, TextChunk};
pub use indexing::{index_document, IndexError, IndexRegistry};
pub use traits::{IngestError, IngestionResult, Ingestor};
pub use vector_store::{EmbeddingEntry, MemoryVectorStore, ScoredChunk};
