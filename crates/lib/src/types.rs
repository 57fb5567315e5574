//! # Prescription Records
//!
//! The record persisted for every successfully ingested prescription upload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted prescription record.
///
/// Serialized in camelCase so the JSON body matches what the web client expects:
/// `{id, userEmail, filePath, extractedText, createdAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub user_email: String,
    pub file_path: String,
    pub extracted_text: String,
    pub created_at: String,
}

/// The fields supplied by the caller when a new record is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrescription {
    pub user_email: String,
    pub file_path: String,
    pub extracted_text: String,
}

impl NewPrescription {
    pub fn new(
        user_email: impl Into<String>,
        file_path: impl Into<String>,
        extracted_text: impl Into<String>,
    ) -> Self {
        Self {
            user_email: user_email.into(),
            file_path: file_path.into(),
            extracted_text: extracted_text.into(),
        }
    }

    /// Assigns an id and creation timestamp, producing the record to persist.
    pub fn into_record(self, now: DateTime<Utc>) -> Prescription {
        Prescription {
            id: Uuid::new_v4().to_string(),
            user_email: self.user_email,
            file_path: self.file_path,
            extracted_text: self.extracted_text,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
