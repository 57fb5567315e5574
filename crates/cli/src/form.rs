//! # Upload Form
//!
//! The state machine behind `medibot upload`:
//!
//! ```text
//! Idle -> Selecting -> Uploading -> Success
//!                  \            \-> Error -> Selecting (retry)
//!                   \-> Error
//! ```
//!
//! The form only tracks state and validation. Performing the request and acting
//! on `Success` (the delayed jump to the chat page) is up to the caller.

use medibot::constants::{has_pdf_magic, PDF_MIME_TYPE};
use medibot::Prescription;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const SELECT_PDF_MESSAGE: &str = "Please select a PDF file";
pub const NO_FILE_MESSAGE: &str = "Please select a file first";
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload prescription";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// How long the success state is shown before moving on to the chat.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// A file the user picked, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Selecting,
    Uploading,
    Success {
        message: String,
        record: Box<Prescription>,
        redirect_after: Duration,
    },
    Error(String),
}

/// Why an upload did not succeed, as seen by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The server answered with an error status, and maybe an `error` message.
    Rejected(Option<String>),
    /// The server could not be reached or answered garbage.
    Transport,
}

/// Guesses the MIME type the way a browser file picker would: by extension,
/// then by content.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    let is_pdf_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf_extension || has_pdf_magic(bytes) {
        PDF_MIME_TYPE
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug)]
pub struct UploadForm {
    state: FormState,
    selected: Option<SelectedFile>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadForm {
    pub fn new() -> Self {
        Self {
            state: FormState::Idle,
            selected: None,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// Picks a file. Anything that is not a PDF clears the selection.
    pub fn select(&mut self, path: &Path, bytes: Vec<u8>) -> &FormState {
        let mime_type = detect_mime_type(path, &bytes);
        if mime_type != PDF_MIME_TYPE {
            self.selected = None;
            self.state = FormState::Error(SELECT_PDF_MESSAGE.to_string());
            return &self.state;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "prescription.pdf".to_string());
        self.selected = Some(SelectedFile {
            path: path.to_path_buf(),
            file_name,
            mime_type,
            bytes,
        });
        self.state = FormState::Selecting;
        &self.state
    }

    /// Moves to `Uploading` and hands out the file to send, or fails with
    /// [`NO_FILE_MESSAGE`] when nothing is selected.
    pub fn begin_upload(&mut self) -> Option<SelectedFile> {
        match &self.selected {
            Some(file) => {
                self.state = FormState::Uploading;
                Some(file.clone())
            }
            None => {
                self.state = FormState::Error(NO_FILE_MESSAGE.to_string());
                None
            }
        }
    }

    /// Records the outcome of the request started by [`UploadForm::begin_upload`].
    pub fn finish(&mut self, outcome: Result<(String, Prescription), UploadFailure>) -> &FormState {
        self.state = match outcome {
            Ok((message, record)) => FormState::Success {
                message,
                record: Box::new(record),
                redirect_after: REDIRECT_DELAY,
            },
            Err(UploadFailure::Rejected(Some(message))) if !message.trim().is_empty() => {
                FormState::Error(message)
            }
            Err(UploadFailure::Rejected(_)) => FormState::Error(UPLOAD_FAILED_MESSAGE.to_string()),
            Err(UploadFailure::Transport) => FormState::Error(SERVER_ERROR_MESSAGE.to_string()),
        };
        &self.state
    }

    /// Leaves the error state so another file can be picked.
    pub fn retry(&mut self) -> &FormState {
        if matches!(self.state, FormState::Error(_)) {
            self.state = FormState::Selecting;
        }
        &self.state
    }
}
