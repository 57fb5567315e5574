//! # Prescription Upload Handlers
//!
//! Accepts a prescription PDF as multipart form data, saves it under the upload
//! directory, extracts its text and stores a record for the uploading user.

use super::{AppError, AppState};
use crate::types::{ListPrescriptionsParams, UploadResponse, UPLOAD_SUCCESS_MESSAGE};
use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use medibot::{
    constants::{has_pdf_magic, PDF_MIME_TYPE},
    Prescription,
};
use medibot_pdf::ingest_prescription;
use std::path::Path;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

/// The multipart field carrying the file.
pub const FILE_FIELD: &str = "prescription";

const FALLBACK_FILE_NAME: &str = "prescription.pdf";

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl UploadedFile {
    fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_MIME_TYPE) || has_pdf_magic(&self.data)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Reduces a client-supplied file name to a safe single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

/// Writes the upload under a name no other upload can share. The file is
/// created exclusively, so an existing file is never overwritten.
async fn save_upload(upload_dir: &str, upload: &UploadedFile) -> anyhow::Result<String> {
    let stored_name = format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(&upload.file_name)
    );
    let path = Path::new(upload_dir).join(stored_name);
    let path = path.to_string_lossy().into_owned();

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create upload file '{path}': {e}"))?;
    file.write_all(&upload.data)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save upload to '{path}': {e}"))?;
    file.flush().await?;
    Ok(path)
}

/// Handles `POST /medical/upload-prescription`.
///
/// The user is identified by the `userEmail` field, or `email` when that is
/// absent or empty. Whitespace-only identifiers are kept as sent. Nothing is
/// written unless the file part is present and looks like a PDF.
pub async fn upload_prescription_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<UploadedFile> = None;
    let mut user_email: Option<String> = None;
    let mut email: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();
                // Browsers send an empty part when no file was chosen.
                if !data.is_empty() {
                    upload = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            "userEmail" => user_email = Some(field.text().await.map_err(multipart_error)?),
            "email" => email = Some(field.text().await.map_err(multipart_error)?),
            _ => warn!("Ignoring unknown multipart field: {}", name),
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    if !upload.is_pdf() {
        return Err(AppError::BadRequest(
            "Only PDF files are accepted".to_string(),
        ));
    }
    let user_email = [user_email, email]
        .into_iter()
        .flatten()
        .find(|e| !e.is_empty())
        .unwrap_or_default();

    let path = save_upload(&app_state.config.upload_dir, &upload).await?;
    info!(user = %user_email, %path, bytes = upload.data.len(), "Saved prescription upload.");

    let record = ingest_prescription(app_state.store.as_ref(), &path, &user_email)
        .await
        .map_err(anyhow::Error::from)?;

    if let Some(embedder) = app_state.embedder.as_deref() {
        app_state
            .indexes
            .index_prescription(
                embedder,
                app_state.chunking,
                &record.extracted_text,
                &user_email,
            )
            .await;
    }

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        data: record,
    }))
}

/// Handles `GET /medical/prescriptions?userEmail=`.
pub async fn list_prescriptions_handler(
    State(app_state): State<AppState>,
    Query(params): Query<ListPrescriptionsParams>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    let records = app_state
        .store
        .list_prescriptions(&params.user_email)
        .await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::{sanitize_file_name, save_upload, UploadedFile};

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\scans\\rx 01.pdf"), "rx_01.pdf");
        assert_eq!(sanitize_file_name("ordonnance-é.pdf"), "ordonnance-_.pdf");
    }

    #[test]
    fn empty_names_fall_back() {
        assert_eq!(sanitize_file_name(""), "prescription.pdf");
        assert_eq!(sanitize_file_name(".."), "prescription.pdf");
    }

    #[tokio::test]
    async fn concurrent_saves_with_one_name_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().to_string_lossy().into_owned();

        let saves = (0..32u8).map(|i| {
            let upload_dir = upload_dir.clone();
            tokio::spawn(async move {
                let upload = UploadedFile {
                    file_name: "rx.pdf".to_string(),
                    content_type: Some("application/pdf".to_string()),
                    data: vec![i; 8],
                };
                save_upload(&upload_dir, &upload).await.map(|path| (i, path))
            })
        });

        let mut paths = Vec::new();
        for save in saves.collect::<Vec<_>>() {
            let (i, path) = save.await.unwrap().unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), vec![i; 8]);
            paths.push(path);
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 32);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 32);
    }
}
