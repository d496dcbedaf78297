use cirrus_ai::AiError;
use thiserror::Error;

/// Errors surfaced by [`crate::ChatSession`]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Request already in flight.")]
    RequestInFlight,

    #[error("Cannot create new chat while request is in flight.")]
    NewChatWhileInFlight,

    #[error("Cannot switch chat while request is in flight.")]
    SwitchWhileInFlight,

    #[error("Empty message.")]
    EmptyMessage,

    #[error("Chat not found.")]
    ChatNotFound(String),

    #[error("Guide not found: {0}")]
    GuideNotFound(String),

    #[error(transparent)]
    Agent(#[from] AiError),
}
