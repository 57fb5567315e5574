use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medibot::PromptError;
use serde_json::json;
use tracing::{error, warn};

/// The body returned for every unexpected failure. Details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// A custom error type for the server application.
///
/// Every variant renders as `{"error": <message>}` with the matching status.
#[derive(Debug)]
pub enum AppError {
    /// The request itself is invalid (400).
    BadRequest(String),
    /// The requested resource does not exist (404).
    NotFound(String),
    /// The request body exceeds the configured upload limit (413).
    PayloadTooLarge,
    /// The feature needed to serve the request is switched off (503).
    Unavailable(String),
    /// Anything else (500).
    Internal(anyhow::Error),
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(msg) => {
                warn!("Bad request: {msg}");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Uploaded file is too large".to_string(),
            ),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
