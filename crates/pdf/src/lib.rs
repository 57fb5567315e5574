//! # medibot-pdf: Prescription Ingestion
//!
//! Turns an uploaded prescription PDF into a stored record: the file is read
//! back from disk, its text is extracted page by page, and a record pointing at
//! the file is written to the prescription store. It implements the `Ingestor`
//! trait from `medibot`.

use async_trait::async_trait;
use medibot::{
    ingest::{IngestError, IngestionResult, Ingestor},
    providers::db::PrescriptionStore,
    NewPrescription, Prescription, PromptError,
};
use pdf::{
    content::{Op, TextDrawAdjusted},
    file::FileOptions,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Appended after the text of every page, including the last one.
pub const PAGE_SEPARATOR: &str = "\n\n";

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum PdfIngestError {
    #[error("Failed to read uploaded file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse PDF content: {0}")]
    PdfParse(String),
    #[error("Storage error: {0}")]
    Storage(#[from] PromptError),
    #[error("An internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PdfIngestError> for IngestError {
    fn from(err: PdfIngestError) -> Self {
        match err {
            PdfIngestError::Io { path, .. } => IngestError::SourceNotFound(path),
            PdfIngestError::PdfParse(s) => IngestError::Parse(s),
            PdfIngestError::Storage(e) => IngestError::Storage(e),
            PdfIngestError::Internal(e) => IngestError::Internal(e),
        }
    }
}

// --- Text Extraction ---

/// Extracts the text of every page synchronously.
///
/// Each page contributes the concatenation of its text-drawing operations
/// followed by [`PAGE_SEPARATOR`]. A page without a content stream contributes
/// only the separator.
pub fn extract_text(pdf_data: &[u8]) -> Result<String, PdfIngestError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| PdfIngestError::PdfParse(e.to_string()))?;
    let resolver = file.resolver();
    let mut full_text = String::new();

    for page_num in 0..file.num_pages() {
        let page = file
            .get_page(page_num)
            .map_err(|e| PdfIngestError::PdfParse(e.to_string()))?;

        match &page.contents {
            Some(content) => {
                let operations = content
                    .operations(&resolver)
                    .map_err(|e| PdfIngestError::PdfParse(e.to_string()))?;
                for op in operations.iter() {
                    match op {
                        Op::TextDraw { text } => full_text.push_str(&text.to_string_lossy()),
                        Op::TextDrawAdjusted { array } => {
                            for item in array.iter() {
                                if let TextDrawAdjusted::Text(text) = item {
                                    full_text.push_str(&text.to_string_lossy());
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            None => warn!("Page {} has no content stream.", page_num),
        }
        full_text.push_str(PAGE_SEPARATOR);
    }
    Ok(full_text)
}

/// Extracts text off the async runtime; parsing is CPU-bound.
pub async fn extract_text_from_pdf(pdf_data: Vec<u8>) -> Result<String, PdfIngestError> {
    let text = tokio::task::spawn_blocking(move || extract_text(&pdf_data))
        .await
        .map_err(|e| {
            PdfIngestError::Internal(anyhow::anyhow!("Tokio join error during PDF parsing: {e}"))
        })??;

    info!(
        "Extracted text from PDF. Total length: {} characters.",
        text.chars().count()
    );
    Ok(text)
}

// --- Pipeline ---

/// Reads the saved upload at `file_path`, extracts its text and stores a record.
///
/// A PDF that yields no text is still stored, with an empty `extracted_text`.
#[instrument(skip(store))]
pub async fn ingest_prescription(
    store: &dyn PrescriptionStore,
    file_path: &str,
    user_email: &str,
) -> Result<Prescription, PdfIngestError> {
    let pdf_data = tokio::fs::read(file_path)
        .await
        .map_err(|source| PdfIngestError::Io {
            path: file_path.to_string(),
            source,
        })?;

    let extracted_text = extract_text_from_pdf(pdf_data).await?;
    if extracted_text.trim().is_empty() {
        warn!("No text could be extracted from '{file_path}'. Storing an empty record.");
    }

    let record = store
        .insert_prescription(NewPrescription::new(user_email, file_path, extracted_text))
        .await?;
    info!(id = %record.id, "Prescription ingested into {}.", store.name());
    Ok(record)
}

// --- Ingestor Implementation ---

/// The `Ingestor` for prescription PDFs already saved to disk.
///
/// The source is the file path and the owner is the uploading user's email.
pub struct PrescriptionIngestor<'a> {
    store: &'a dyn PrescriptionStore,
}

impl<'a> PrescriptionIngestor<'a> {
    pub fn new(store: &'a dyn PrescriptionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Ingestor for PrescriptionIngestor<'_> {
    async fn ingest(
        &self,
        source: &str,
        owner_id: Option<&str>,
    ) -> Result<IngestionResult, IngestError> {
        let record = ingest_prescription(self.store, source, owner_id.unwrap_or_default()).await?;

        Ok(IngestionResult {
            source: source.to_string(),
            documents_added: 1,
            document_ids: vec![record.id],
        })
    }
}
