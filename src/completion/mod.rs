//! Completion service adapter.
//!
//! The conversation store talks to the service through [`CompletionClient`],
//! which returns a tagged result: a genuine reply or a [`CompletionError`].
//! [`GeminiClient`] is the production implementation.

pub mod gemini;

pub use gemini::GeminiClient;

use thiserror::Error;

/// Why a completion request produced no reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key was configured.
    #[error("no API key configured for the completion service")]
    MissingCredential,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),

    /// Network or protocol failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,

        /// Error message reported by the service.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No completion service is attached to the conversation store.
    #[error("no completion service attached")]
    Offline,

    /// The service returned no text, e.g. because the prompt was blocked.
    #[error("empty reply: {0}")]
    EmptyReply(String),
}

/// Sends a single prompt to a generative-text service.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a reply to `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompletionError`] if no reply text could be obtained.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
