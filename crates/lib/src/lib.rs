//! # MediBot Core
//!
//! This crate holds the building blocks of the MediBot backend: the AI and
//! embedding provider clients, the prompt templates, the conversation
//! summarization pipeline, the text chunking and in-memory vector indexing
//! stage, and the prescription record store.

pub mod constants;
pub mod errors;
pub mod ingest;
pub mod prompts;
pub mod providers;
pub mod summarize;
pub mod types;

pub use errors::PromptError;
pub use summarize::{summarize_conversation, SummaryPrompts, SUMMARY_FALLBACK};
pub use types::{NewPrescription, Prescription};
