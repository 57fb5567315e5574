//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `medibot-server`.
//! The handlers are split into sub-modules by functionality.

pub mod general;
pub mod prescription;
pub mod search;
pub mod summary;

// Re-export all handlers so the router can reach them under `handlers::`.
pub use general::*;
pub use prescription::*;
pub use search::*;
pub use summary::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
