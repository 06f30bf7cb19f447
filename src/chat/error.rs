//! Error types for the chat client.

use thiserror::Error;

/// Errors that can occur during chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("backend returned HTTP status {0}")]
    HttpStatus(u16),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing persisted state failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Regex error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
