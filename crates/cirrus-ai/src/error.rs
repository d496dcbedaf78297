//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key. Set OPENAI_API_KEY in the environment or the config file.")]
    MissingCredentials,

    #[error("HTTP {status}: {message}")]
    LlmHttp { status: u16, message: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("No message in response.")]
    NoMessage,

    #[error("Request timed out.")]
    Timeout,

    #[error("Request cancelled.")]
    Cancelled,

    #[error("Agent reached maximum iterations ({0}) without a final response.")]
    MaxIterations(usize),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// Whether the failure came from the provider rejecting the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::LlmHttp { status, .. } => Some(*status),
            AiError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
