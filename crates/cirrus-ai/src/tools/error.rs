//! Error types for the tools module.
//!
//! Backend failures never escape tool dispatch: the registry renders them as
//! `Error: <message>` tool results, so the `Display` text is what the model sees.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    /// The backend lacks credentials or required context.
    #[error("{0}")]
    NotConfigured(String),

    /// Token acquisition failed.
    #[error("{0}")]
    Auth(String),

    /// The remote API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request itself was invalid (folder instead of file, bad id, ...).
    #[error("{0}")]
    InvalidRequest(String),

    /// Every source the backend tried failed.
    #[error("{0}")]
    Unavailable(String),

    /// Downloaded bytes could not be turned into text.
    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;
