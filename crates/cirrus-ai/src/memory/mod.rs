//! Conversation memory
//!
//! - **Memory Journal**: rolling `Q:`/`A:` digests of completed turns
//!   (bounded FIFO, updated by the host after each successful turn)
//! - **Compaction**: pure rebuild of an oversized conversation from the
//!   leading system prompt, the journal and a compressed recent tail
//!
//! ```text
//! conversation ──► compact_conversation(messages, journal)
//!                     │
//!                     ├─ Unchanged           (≤ 24 messages, or within budget)
//!                     └─ Rebuilt(messages)   [system, memory summary?, tail ≤ 22]
//! ```

mod compaction;
mod journal;

pub use compaction::{
    Compaction, CompactionConfig, MEMORY_SUMMARY_HEADER, compact_conversation,
    compact_with_config, total_content_chars,
};
pub use journal::{ANSWER_MAX_CHARS, JOURNAL_CAPACITY, MemoryJournal, QUESTION_MAX_CHARS};
