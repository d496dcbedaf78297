use std::time::Duration;

use crate::memory::CompactionConfig;

/// Default number of completion requests allowed per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Default overall timeout for one completion request.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(90);

/// Default character budget of a tool result appended to the conversation.
pub const DEFAULT_TOOL_RESULT_MAX_CHARS: usize = 9_000;

/// Status line sent after every batch of tool calls.
pub const THINKING_NOTICE: &str = "Thinking...";

/// Answer used when the model ends a turn with empty content.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No response text returned.";

/// Configuration for one agent turn
#[derive(Debug, Clone)]
pub struct AgentLoopConfig {
    /// Completion requests allowed before giving up (default: 8).
    pub max_iterations: usize,
    /// Wall-clock limit of a single completion request (default: 90s).
    pub completion_timeout: Duration,
    /// Max length for tool results (default: 9000)
    pub tool_result_max_chars: usize,
    pub compaction: CompactionConfig,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            tool_result_max_chars: DEFAULT_TOOL_RESULT_MAX_CHARS,
            compaction: CompactionConfig::default(),
        }
    }
}

impl AgentLoopConfig {
    /// Set max iterations
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the completion request timeout
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Set max tool result length
    pub fn with_tool_result_max_chars(mut self, max: usize) -> Self {
        self.tool_result_max_chars = max;
        self
    }
}
