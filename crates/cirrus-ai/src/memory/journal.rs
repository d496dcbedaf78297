//! Memory Journal - rolling log of completed question/answer turns
//!
//! Each successful turn leaves a short `Q:`/`A:` digest here. When compaction
//! discards older messages, the journal is what keeps them in the model's view.
//!
//! # Example
//!
//! ```
//! use cirrus_ai::memory::MemoryJournal;
//!
//! let mut journal = MemoryJournal::new();
//! journal.record("Where is the Q3 budget?", "It is in Finance/Budget-Q3.xlsx.");
//!
//! assert_eq!(journal.len(), 1);
//! assert!(journal.entries().next().unwrap().starts_with("Q: Where"));
//! ```

use std::collections::VecDeque;

use crate::text_utils::compress;

/// Maximum number of entries kept before the oldest is evicted
pub const JOURNAL_CAPACITY: usize = 18;

/// Character budget for the question half of an entry
pub const QUESTION_MAX_CHARS: usize = 260;

/// Character budget for the answer half of an entry
pub const ANSWER_MAX_CHARS: usize = 360;

/// Bounded FIFO of turn digests.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    entries: VecDeque<String>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a digest of one finished turn.
    ///
    /// Skipped when both question and answer are blank.
    pub fn record(&mut self, question: &str, answer: &str) {
        let q = compress(question.trim(), QUESTION_MAX_CHARS);
        let a = compress(answer.trim(), ANSWER_MAX_CHARS);
        if q.is_empty() && a.is_empty() {
            return;
        }

        self.entries.push_back(format!("Q: {q}\nA: {a}"));
        while self.entries.len() > JOURNAL_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Entries oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries joined by blank lines, the form used in the memory summary.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_format() {
        let mut journal = MemoryJournal::new();
        journal.record("  hello  ", "\nhi there\n");
        assert_eq!(journal.entries().collect::<Vec<_>>(), vec!["Q: hello\nA: hi there"]);
    }

    #[test]
    fn test_blank_turn_is_skipped() {
        let mut journal = MemoryJournal::new();
        journal.record("   ", "");
        assert!(journal.is_empty());

        journal.record("", "only an answer");
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_nineteenth_entry_evicts_first() {
        let mut journal = MemoryJournal::new();
        for i in 0..19 {
            journal.record(&format!("q{i}"), &format!("a{i}"));
        }

        assert_eq!(journal.len(), JOURNAL_CAPACITY);
        let entries: Vec<&str> = journal.entries().collect();
        assert_eq!(entries[0], "Q: q1\nA: a1");
        assert_eq!(entries[17], "Q: q18\nA: a18");
    }

    #[test]
    fn test_long_answers_are_compressed() {
        let mut journal = MemoryJournal::new();
        journal.record("q", &"a".repeat(2_000));
        let entry = journal.entries().next().unwrap();
        assert!(entry.contains("...[truncated"));
        assert!(entry.chars().count() < 2_000);
    }

    #[test]
    fn test_render_and_clear() {
        let mut journal = MemoryJournal::new();
        journal.record("one", "1");
        journal.record("two", "2");
        assert_eq!(journal.render(), "Q: one\nA: 1\n\nQ: two\nA: 2");

        journal.clear();
        assert!(journal.is_empty());
        assert_eq!(journal.render(), "");
    }
}
