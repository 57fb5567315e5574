use crate::errors::PromptError;
use async_trait::async_trait;
use thiserror::Error;

/// A generic error type for all ingestion plugins.
///
/// Each plugin is responsible for mapping its specific errors (e.g., PDF parsing
/// errors) into these standardized variants.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("The specified source could not be found: {0}")]
    SourceNotFound(String),

    #[error("Failed to parse the content from the source: {0}")]
    Parse(String),

    #[error("A storage operation failed during ingestion: {0}")]
    Storage(#[from] PromptError),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Represents the successful result of an ingestion operation.
#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
    /// The original source identifier (e.g., file path) that was processed.
    pub source: String,
    /// The number of new records successfully added to the store.
    pub documents_added: usize,
    /// The ids of the newly created records.
    pub document_ids: Vec<String>,
}

/// A generic trait that defines the contract for an ingestion plugin.
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Runs the entire ingestion pipeline for `source`.
    ///
    /// # Arguments
    ///
    /// * `source`: The identifier for the content to ingest (e.g., a path on disk).
    /// * `owner_id`: The identifier of the user who owns the ingested content.
    async fn ingest(
        &self,
        source: &str,
        owner_id: Option<&str>,
    ) -> Result<IngestionResult, IngestError>;
}
