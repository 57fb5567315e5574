//! # API Client
//!
//! This module provides a client for the `medibot-server` HTTP API.

use crate::form::{SelectedFile, UploadFailure};
use anyhow::{bail, Result};
use medibot::Prescription;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    message: String,
    data: Prescription,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

/// The client for making API calls to the `medibot-server`.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends the file as the `prescription` part, with the user's email.
    pub async fn upload_prescription(
        &self,
        file: SelectedFile,
        user_email: &str,
    ) -> Result<(String, Prescription), UploadFailure> {
        let url = format!("{}/medical/upload-prescription", self.base_url);
        info!("Uploading '{}' to {}", file.file_name, url);

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.mime_type)
            .map_err(|e| {
                error!("Invalid MIME type: {e}");
                UploadFailure::Transport
            })?;
        let form = Form::new()
            .text("userEmail", user_email.to_string())
            .part("prescription", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload request failed: {e}");
                UploadFailure::Transport
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<ErrorBody> = response.json().await.ok();
            error!("Server rejected upload with {status}: {body:?}");
            return Err(UploadFailure::Rejected(body.and_then(|b| b.error)));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            error!("Unreadable upload response: {e}");
            UploadFailure::Transport
        })?;
        Ok((body.message, body.data))
    }

    pub async fn summarize(&self, conversation_history: &str, user_email: &str) -> Result<String> {
        let url = format!("{}/medical/summarize", self.base_url);
        info!("Requesting summary from: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "conversationHistory": conversation_history,
                "userEmail": user_email,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!(
                "Failed to summarize conversation. Server responded with {}: {}",
                status,
                error_text
            );
        }

        let body: SummaryResponse = response.json().await?;
        Ok(body.summary)
    }

    pub async fn list_prescriptions(&self, user_email: &str) -> Result<Vec<Prescription>> {
        let url = format!("{}/medical/prescriptions", self.base_url);
        info!("Fetching prescriptions from: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("userEmail", user_email)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!(
                "Failed to fetch prescriptions. Server responded with {}: {}",
                status,
                error_text
            );
        }

        Ok(response.json().await?)
    }
}
