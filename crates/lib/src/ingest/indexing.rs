//! # Indexing Stage
//!
//! The optional stage that runs after a prescription has been stored: split the
//! extracted text into chunks, embed every chunk, and keep the resulting vector
//! store in memory so the user's document can be searched.
//!
//! Each document gets its own store. The [`IndexRegistry`] keeps the one built
//! from the user's latest upload; a new upload replaces (or, when it cannot be
//! indexed, evicts) the previous index of that user and indexes are never
//! merged across documents or users.

use crate::{
    errors::PromptError,
    ingest::{
        chunking::ChunkingPolicy,
        vector_store::{MemoryVectorStore, ScoredChunk},
    },
    providers::ai::EmbeddingProvider,
};
use futures::{stream, StreamExt, TryStreamExt};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

/// How many chunks are sent to the embedding service at once.
const EMBEDDING_CONCURRENCY: usize = 4;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Text content is empty or only whitespace")]
    EmptyContent,
    #[error("Embedding generation failed for chunk {index}: {source}")]
    Embedding {
        index: usize,
        #[source]
        source: PromptError,
    },
    #[error("No index found for user '{0}'")]
    NotFound(String),
}

/// Chunks and embeds `text`, returning a fresh vector store for it.
pub async fn index_document(
    embedder: &dyn EmbeddingProvider,
    policy: ChunkingPolicy,
    text: &str,
) -> Result<MemoryVectorStore, IndexError> {
    if text.trim().is_empty() {
        return Err(IndexError::EmptyContent);
    }

    let chunks = policy.split(text);
    let embedded: Vec<_> = stream::iter(chunks)
        .map(|chunk| async move {
            embedder
                .embed(&chunk.content)
                .await
                .map(|vector| (chunk.clone(), vector))
                .map_err(|source| IndexError::Embedding {
                    index: chunk.index,
                    source,
                })
        })
        .buffered(EMBEDDING_CONCURRENCY)
        .try_collect()
        .await?;

    let mut store = MemoryVectorStore::new();
    for (chunk, vector) in embedded {
        store.add(chunk, vector);
    }
    Ok(store)
}

/// A user's slot in the registry. `index` is `None` after the latest upload
/// failed to index, so searches never fall back to an older document.
#[derive(Debug)]
struct IndexSlot {
    ticket: u64,
    index: Option<Arc<MemoryVectorStore>>,
}

/// The index of every user's latest upload, held in process memory.
///
/// Every indexing run takes a ticket when it starts. A run only installs its
/// outcome if no later-started run for the same user has installed one, so
/// uploads finishing out of order never bring back an older document.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    slots: Arc<RwLock<HashMap<String, IndexSlot>>>,
    next_ticket: Arc<AtomicU64>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Installs the outcome of the run holding `ticket`. Returns `false` when a
    /// later run already installed its own outcome for this user.
    fn install(&self, user_email: &str, ticket: u64, index: Option<MemoryVectorStore>) -> bool {
        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slots
            .get(user_email)
            .is_some_and(|slot| slot.ticket > ticket)
        {
            return false;
        }
        slots.insert(
            user_email.to_string(),
            IndexSlot {
                ticket,
                index: index.map(Arc::new),
            },
        );
        true
    }

    /// Stores `index` as the user's current index, dropping any previous one.
    pub fn replace(&self, user_email: &str, index: MemoryVectorStore) {
        let ticket = self.ticket();
        self.install(user_email, ticket, Some(index));
    }

    pub fn get(&self, user_email: &str) -> Option<Arc<MemoryVectorStore>> {
        let slots = self
            .slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(user_email).and_then(|slot| slot.index.clone())
    }

    /// Number of users with a searchable index.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|slot| slot.index.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indexes a stored prescription's text for `user_email`.
    ///
    /// Failures are logged and swallowed so they never abort the upload that
    /// triggered them, but they still evict the user's previous index. Returns
    /// the number of indexed chunks when this run's index was installed.
    pub async fn index_prescription(
        &self,
        embedder: &dyn EmbeddingProvider,
        policy: ChunkingPolicy,
        extracted_text: &str,
        user_email: &str,
    ) -> Option<usize> {
        let ticket = self.ticket();
        match index_document(embedder, policy, extracted_text).await {
            Ok(store) => {
                let chunks = store.len();
                if !self.install(user_email, ticket, Some(store)) {
                    info!("Discarding stale vector index for {user_email}; a newer upload was indexed first.");
                    return None;
                }
                info!("Prescription stored in vector index for {user_email} ({chunks} chunks).");
                Some(chunks)
            }
            Err(e) => {
                error!("Failed to store prescription in vector index for {user_email}: {e}");
                if self.install(user_email, ticket, None) {
                    warn!("Previous vector index for {user_email} was dropped.");
                }
                None
            }
        }
    }

    /// Embeds `query` and searches the user's index.
    pub async fn search(
        &self,
        embedder: &dyn EmbeddingProvider,
        user_email: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let index = self
            .get(user_email)
            .ok_or_else(|| IndexError::NotFound(user_email.to_string()))?;
        let query_vector = embedder
            .embed(query)
            .await
            .map_err(|source| IndexError::Embedding { index: 0, source })?;
        Ok(index.similarity_search(&query_vector, limit))
    }
}
