//! Error types surfaced to the user
//!
//! None of these are fatal: the shell turns each one into a notification
//! and carries on with the session.

use std::path::{Path, PathBuf};

/// A file could not be opened or its duration could not be read
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Could not process file: {}\nError: {message}", .path.display())]
pub struct ProbeError {
    pub path: PathBuf,
    pub message: String,
}

impl ProbeError {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// The speed factor typed by the user is unusable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("speed must be a number, got {0:?}")]
    NotANumber(String),

    #[error("speed must be positive")]
    NonPositive(f64),
}

/// Anything that stops a calculate action from producing a result
#[derive(Debug, thiserror::Error)]
pub enum CalculationError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}
