//! Cirrus core - configuration, guides and the chat session host
//!
//! `ChatSession` is the object every front end talks to: it owns the current
//! conversation and its memory journal, allows one agent turn at a time and
//! keeps the persisted chat state in step.

pub mod bootstrap;
pub mod config;
mod error;
pub mod guides;
pub mod prompt;
pub mod session;

pub use bootstrap::{llm_client, open_session, tool_registry};
pub use cirrus_storage::paths;
pub use config::AppConfig;
pub use error::SessionError;
pub use guides::{GUIDE_CONTEXT_PREFIX, Guide, catalog, find_guide, search_guides};
pub use session::{ChatSession, HistoryItem, TranscriptLine};
