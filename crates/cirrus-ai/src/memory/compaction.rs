//! Context compaction for the live conversation.
//!
//! Compaction is a pure function of the message list and the memory journal.
//! Small conversations pass through untouched; large ones are rebuilt from the
//! leading system prompt, a memory summary and a compressed recent tail.

use tracing::debug;

use crate::llm::{Message, Role};
use crate::text_utils::{char_len, compress};

use super::journal::MemoryJournal;

/// Header of the system message carrying the journal.
pub const MEMORY_SUMMARY_HEADER: &str = "Conversation memory summary from earlier turns:\n";

/// Compaction thresholds.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Conversations of at most this many messages are never touched (default: 24).
    pub min_messages: usize,
    /// Rebuild once the message count exceeds this (default: 34).
    pub max_messages: usize,
    /// Rebuild once total content characters reach this (default: 52_000).
    pub max_total_chars: usize,
    /// Number of trailing messages considered for the rebuilt tail (default: 22).
    pub tail_messages: usize,
    /// Character budget of the memory summary message (default: 5_000).
    pub summary_max_chars: usize,
    /// Per-message budget for tool results in the tail (default: 5_000).
    pub tool_max_chars: usize,
    /// Per-message budget for other messages in the tail (default: 7_000).
    pub message_max_chars: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            min_messages: 24,
            max_messages: 34,
            max_total_chars: 52_000,
            tail_messages: 22,
            summary_max_chars: 5_000,
            tool_max_chars: 5_000,
            message_max_chars: 7_000,
        }
    }
}

/// Outcome of a compaction pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Compaction {
    /// The conversation is within budget; keep it as is.
    Unchanged,
    /// Replacement contents for the conversation.
    Rebuilt(Vec<Message>),
}

impl Compaction {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, Compaction::Rebuilt(_))
    }
}

/// Total characters of message content. Tool-call arguments do not count.
pub fn total_content_chars(messages: &[Message]) -> usize {
    messages.iter().map(|m| char_len(m.text())).sum()
}

/// Compact with the default thresholds.
pub fn compact_conversation(messages: &[Message], journal: &MemoryJournal) -> Compaction {
    compact_with_config(messages, journal, &CompactionConfig::default())
}

pub fn compact_with_config(
    messages: &[Message],
    journal: &MemoryJournal,
    config: &CompactionConfig,
) -> Compaction {
    if messages.len() <= config.min_messages {
        return Compaction::Unchanged;
    }

    let total_chars = total_content_chars(messages);
    if messages.len() <= config.max_messages && total_chars < config.max_total_chars {
        return Compaction::Unchanged;
    }

    let mut rebuilt = Vec::with_capacity(config.tail_messages + 2);
    if let Some(first) = messages.first() {
        rebuilt.push(first.clone());
    }

    if !journal.is_empty() {
        let summary = format!("{MEMORY_SUMMARY_HEADER}{}", journal.render());
        rebuilt.push(Message::system(compress(&summary, config.summary_max_chars)));
    }

    let start = messages.len().saturating_sub(config.tail_messages);
    // A tool result whose assistant call fell outside the window is dropped.
    let tail = messages[start..]
        .iter()
        .filter(|m| m.role != Role::System)
        .skip_while(|m| m.role == Role::Tool);

    for original in tail {
        let mut msg = original.clone();
        if let Some(content) = msg.content.as_deref().filter(|c| !c.is_empty()) {
            let max = if msg.role == Role::Tool {
                config.tool_max_chars
            } else {
                config.message_max_chars
            };
            msg.content = Some(compress(content, max));
        }
        rebuilt.push(msg);
    }

    debug!(
        before = messages.len(),
        after = rebuilt.len(),
        total_chars,
        journal_entries = journal.len(),
        "Compacted conversation"
    );

    Compaction::Rebuilt(rebuilt)
}
