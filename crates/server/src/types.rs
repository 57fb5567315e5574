//! Request and response bodies of the HTTP API.

use medibot::{ingest::ScoredChunk, Prescription};
use serde::{Deserialize, Serialize};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Prescription uploaded successfully!";

#[derive(Serialize, Deserialize, Debug)]
pub struct UploadResponse {
    pub message: String,
    pub data: Prescription,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default)]
    pub conversation_history: String,
    #[serde(default)]
    pub user_email: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SummarizeResponse {
    pub summary: String,
}

fn default_search_limit() -> usize {
    4
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub user_email: String,
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Serialize, Debug)]
pub struct SearchResponse {
    pub results: Vec<ScoredChunk>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListPrescriptionsParams {
    pub user_email: String,
}
