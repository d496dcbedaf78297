//! Agent module - the bounded tool-use loop behind every chat turn
//!
//! ```text
//! ┌──────────── up to 8 iterations ────────────┐
//! │ compact → complete ─┬─ tool calls → dispatch ┤
//! │                     └─ text → answer         │
//! └──────────────────────────────────────────────┘
//! ```

mod agent_loop;

use std::sync::Arc;

pub use agent_loop::{
    AgentLoop, AgentLoopConfig, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOOL_RESULT_MAX_CHARS, EMPTY_RESPONSE_PLACEHOLDER, THINKING_NOTICE,
};

/// Progress callback for status lines ("Searching Drive...", "Thinking...").
pub type Notifier = Arc<dyn Fn(&str) + Send + Sync>;

/// A notifier that drops every status line.
pub fn noop_notifier() -> Notifier {
    Arc::new(|_: &str| {})
}
