//! # Prompt Template Modules
//!
//! This module organizes all prompt templates used throughout the `medibot` library.
//! It is divided into sub-modules based on the task the prompts serve.

pub mod summary;

/// Replaces every `{key}` placeholder in `template` with its value.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
