//! Chat state persistence.
//!
//! The whole chat state (current chat id, its messages and the archived chat
//! history) is stored as one JSON document under a single key and
//! round-tripped wholesale.

use anyhow::{Context, Result};
use cirrus_ai::text_utils::truncate_with_suffix;
use cirrus_ai::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::{SimpleStorage, define_simple_storage};

/// Most chats kept in history; the oldest fall off.
pub const HISTORY_LIMIT: usize = 50;

/// History titles are cut to this many characters of the first question.
pub const TITLE_MAX_CHARS: usize = 55;

const TITLE_ELLIPSIS: &str = "\u{2026}";
const UNTITLED_CHAT: &str = "New Chat";
const STATE_KEY: &str = "current";
const STATE_VERSION: u32 = 1;

/// One archived chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch when the chat was last archived.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Everything needed to resume where the user left off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub current_chat_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub chat_history: Vec<ChatHistoryEntry>,
}

impl ChatState {
    pub fn new(current_chat_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            version: STATE_VERSION,
            current_chat_id: current_chat_id.into(),
            messages,
            chat_history: Vec::new(),
        }
    }

    /// Copy the current chat into history.
    ///
    /// Chats without a user message are not archived. An existing entry with
    /// the same id is replaced and the fresh copy moves to the front; history
    /// is capped at [`HISTORY_LIMIT`]. Returns whether anything was archived.
    pub fn archive_current(&mut self, timestamp: i64) -> bool {
        if !self.messages.iter().any(|m| m.role == Role::User) {
            return false;
        }

        let id = self.current_chat_id.clone();
        self.chat_history.retain(|entry| entry.id != id);
        self.chat_history.insert(
            0,
            ChatHistoryEntry {
                title: chat_title(&self.messages),
                id,
                timestamp,
                messages: self.messages.clone(),
            },
        );
        self.chat_history.truncate(HISTORY_LIMIT);
        true
    }

    pub fn find_chat(&self, id: &str) -> Option<&ChatHistoryEntry> {
        self.chat_history.iter().find(|entry| entry.id == id)
    }

    /// History sorted newest first.
    pub fn history_newest_first(&self) -> Vec<&ChatHistoryEntry> {
        let mut sorted: Vec<&ChatHistoryEntry> = self.chat_history.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }
}

/// Title of a chat: its first non-empty user message, cut to [`TITLE_MAX_CHARS`].
pub fn chat_title(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(Message::text)
        .find(|text| !text.is_empty())
        .map(|text| truncate_with_suffix(text, TITLE_MAX_CHARS, TITLE_ELLIPSIS))
        .unwrap_or_else(|| UNTITLED_CHAT.to_string())
}

define_simple_storage! {
    /// Persisted chat state.
    pub struct ChatStateStorage { table: "chat_state" }
}

impl ChatStateStorage {
    /// Load the saved chat state, if any.
    pub fn load(&self) -> Result<Option<ChatState>> {
        let Some(bytes) = self.get_raw(STATE_KEY)? else {
            return Ok(None);
        };
        let state = serde_json::from_slice(&bytes).context("Failed to decode saved chat state")?;
        Ok(Some(state))
    }

    /// Replace the saved chat state.
    pub fn save(&self, state: &ChatState) -> Result<()> {
        let mut state = state.clone();
        state.version = STATE_VERSION;
        let bytes = serde_json::to_vec(&state).context("Failed to encode chat state")?;
        self.put_raw(STATE_KEY, &bytes)
    }

    /// Forget the saved chat state. Returns true if one existed.
    pub fn clear(&self) -> Result<bool> {
        self.delete(STATE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::Database;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn storage() -> (tempfile::TempDir, ChatStateStorage) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("chat_state.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (temp_dir, ChatStateStorage::new(db).unwrap())
    }

    fn chat(question: &str) -> Vec<Message> {
        vec![
            Message::system("You are Cirrus."),
            Message::user(question),
            Message::assistant("Sure."),
        ]
    }

    #[test]
    fn test_load_missing_returns_none() {
        let (_dir, storage) = storage();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_dir, storage) = storage();
        let mut state = ChatState::new("chat-1", chat("What is in Q3.xlsx?"));
        state.archive_current(1_000);

        storage.save(&state).unwrap();
        let loaded = storage.load().unwrap().unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn test_clear_forgets_state() {
        let (_dir, storage) = storage();
        storage.save(&ChatState::new("chat-1", chat("hi"))).unwrap();

        assert!(storage.clear().unwrap());
        assert!(storage.load().unwrap().is_none());
        assert!(!storage.clear().unwrap());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let (_dir, storage) = storage();
        storage.put_raw(STATE_KEY, b"not json").unwrap();
        assert!(storage.load().is_err());
    }

    #[test]
    fn test_archive_requires_user_message() {
        let mut state = ChatState::new("chat-1", vec![Message::system("You are Cirrus.")]);
        assert!(!state.archive_current(1));
        assert!(state.chat_history.is_empty());
    }

    #[test]
    fn test_archive_replaces_same_id_and_moves_to_front() {
        let mut state = ChatState::new("chat-1", chat("first"));
        state.archive_current(1);

        state.current_chat_id = "chat-2".to_string();
        state.messages = chat("second");
        state.archive_current(2);

        state.current_chat_id = "chat-1".to_string();
        state.messages = chat("first, revisited");
        state.archive_current(3);

        let ids: Vec<&str> = state.chat_history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["chat-1", "chat-2"]);
        assert_eq!(state.chat_history[0].title, "first, revisited");
        assert_eq!(state.chat_history[0].timestamp, 3);
    }

    #[test]
    fn test_history_is_capped() {
        let mut state = ChatState::default();
        for i in 0..(HISTORY_LIMIT + 5) {
            state.current_chat_id = format!("chat-{i}");
            state.messages = chat(&format!("question {i}"));
            state.archive_current(i as i64);
        }

        assert_eq!(state.chat_history.len(), HISTORY_LIMIT);
        assert_eq!(state.chat_history[0].id, "chat-54");
        assert!(state.find_chat("chat-4").is_none());
        assert!(state.find_chat("chat-5").is_some());
    }

    #[test]
    fn test_history_newest_first_sorts_by_timestamp() {
        let mut state = ChatState::default();
        state.chat_history = vec![
            ChatHistoryEntry {
                id: "old".to_string(),
                title: "old".to_string(),
                timestamp: 10,
                messages: Vec::new(),
            },
            ChatHistoryEntry {
                id: "new".to_string(),
                title: "new".to_string(),
                timestamp: 20,
                messages: Vec::new(),
            },
        ];

        let ids: Vec<&str> = state
            .history_newest_first()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_chat_title_truncates_long_questions() {
        let long = "a".repeat(60);
        let title = chat_title(&chat(&long));
        assert_eq!(title, format!("{}\u{2026}", "a".repeat(55)));

        assert_eq!(chat_title(&chat(&"b".repeat(55))), "b".repeat(55));
    }

    #[test]
    fn test_chat_title_skips_empty_user_messages() {
        let messages = vec![Message::user(""), Message::user("Find the budget")];
        assert_eq!(chat_title(&messages), "Find the budget");
        assert_eq!(chat_title(&[Message::user("")]), "New Chat");
    }
}
