//! Centralized error types for GraphVC.

use thiserror::Error;

/// Main error type for GraphVC core operations.
#[derive(Error, Debug)]
pub enum GraphvcError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Input too short: {actual} characters, at least {min} required")]
    InputTooShort { min: usize, actual: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for GraphVC core operations.
pub type GraphvcResult<T> = Result<T, GraphvcError>;

impl GraphvcError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
