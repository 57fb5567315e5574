//! # Shared Constants
//!
//! This module provides a centralized location for constants that are shared across
//! multiple crates in the `medibot` workspace.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/medibot.db";

/// The default directory where uploaded prescription files are written.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// The MIME type accepted by the prescription upload endpoint.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Every PDF file starts with this header.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Placeholder used when no chat API key is configured. It is never a valid key,
/// so requests made with it fail at the provider and the caller degrades.
pub const MISSING_API_KEY_PLACEHOLDER: &str = "unset-api-key-configure-GROQ_API_KEY";

/// Returns `true` if the bytes look like a PDF document.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}
