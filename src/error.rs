//! Error types for parley.

use std::io;
use thiserror::Error;

/// Result type alias for parley operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in parley operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A form field failed local validation.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,

        /// Human-readable reason.
        message: String,
    },

    /// Login rejected.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Operation requires an authenticated session.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Persisted snapshot was written by a newer format.
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion service could not be reached or produced no reply.
    #[error("Completion failed: {0}")]
    Completion(String),

    /// No conversation with the given id.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
}

impl From<crate::completion::CompletionError> for Error {
    fn from(e: crate::completion::CompletionError) -> Self {
        Self::Completion(e.to_string())
    }
}

impl Error {
    /// Shorthand for a validation error on `field`.
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
