//! Chat session host.
//!
//! Owns the current conversation, its memory journal and the archived chat
//! history, runs one agent turn at a time and persists state after every
//! change. Persistence failures are logged and never fail an operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cirrus_ai::{
    AgentLoop, AgentLoopConfig, BackendKind, LlmClient, MemoryJournal, Message, Notifier, Role,
    ToolRegistry,
};
use cirrus_storage::{ChatState, ChatStateStorage};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::guides::{GUIDE_CONTEXT_PREFIX, Guide, find_guide};
use crate::prompt::{default_system_prompt, welcome_message};

/// A line of the user-visible transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub is_user: bool,
    pub text: String,
}

/// A chat as listed in the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    pub timestamp: i64,
    pub is_current: bool,
}

struct SessionState {
    chat: ChatState,
    journal: MemoryJournal,
}

pub struct ChatSession {
    agent: AgentLoop,
    registry: Arc<ToolRegistry>,
    store: Option<ChatStateStorage>,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
}

impl ChatSession {
    /// Start a session on a fresh chat. Nothing is persisted until a store is attached.
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        let system_prompt = system_prompt_for(&registry);
        Self {
            agent: AgentLoop::new(llm, registry.clone()),
            registry,
            store: None,
            state: Mutex::new(SessionState {
                chat: ChatState::new(new_chat_id(), vec![Message::system(system_prompt)]),
                journal: MemoryJournal::new(),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_store(mut self, store: ChatStateStorage) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_agent_config(mut self, config: AgentLoopConfig) -> Self {
        self.agent = self.agent.with_config(config);
        self
    }

    pub fn has_drive(&self) -> bool {
        self.registry.is_configured(BackendKind::GoogleDrive)
    }

    pub fn has_onedrive(&self) -> bool {
        self.registry.is_configured(BackendKind::OneDrive)
    }

    pub fn system_prompt(&self) -> String {
        system_prompt_for(&self.registry)
    }

    pub fn welcome_message(&self) -> String {
        welcome_message(self.has_drive(), self.has_onedrive())
    }

    /// Whether an agent turn is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Resume the saved chat, if there is one with messages.
    ///
    /// A restored chat gets the default system prompt when it has none; the
    /// memory journal always starts empty. Returns whether a chat was restored.
    pub async fn restore(&self) -> bool {
        let saved = match &self.store {
            Some(store) => store.load().unwrap_or_else(|err| {
                warn!(error = %err, "Failed to load saved chat state");
                None
            }),
            None => None,
        };

        let mut state = self.state.lock().await;
        state.journal.clear();

        match saved {
            Some(mut chat) if !chat.messages.is_empty() => {
                if !chat.messages.iter().any(|m| m.role == Role::System) {
                    chat.messages.insert(0, Message::system(self.system_prompt()));
                }
                if chat.current_chat_id.is_empty() {
                    chat.current_chat_id = new_chat_id();
                }
                info!(chat_id = %chat.current_chat_id, messages = chat.messages.len(), "Restored chat");
                state.chat = chat;
                true
            }
            saved => {
                let history = saved.map(|s| s.chat_history).unwrap_or_default();
                state.chat = ChatState::new(new_chat_id(), vec![Message::system(self.system_prompt())]);
                state.chat.chat_history = history;
                self.persist(&mut state);
                false
            }
        }
    }

    /// Run one turn for `text` and return the assistant's answer.
    pub async fn send(
        &self,
        text: &str,
        notify: &Notifier,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SessionError::RequestInFlight);
        }
        let _guard = scopeguard::guard((), |_| {
            self.in_flight.store(false, Ordering::SeqCst);
        });

        let question = text.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (mut conversation, journal) = {
            let mut state = self.state.lock().await;
            state.chat.messages.push(Message::user(question));
            self.persist(&mut state);
            (state.chat.messages.clone(), state.journal.clone())
        };

        // Run unlocked so reads stay responsive; chat switches are refused while busy.
        let outcome = self
            .agent
            .run(&mut conversation, &journal, notify, cancel)
            .await;

        let mut state = self.state.lock().await;
        state.chat.messages = conversation;
        match outcome {
            Ok(answer) => {
                state.chat.messages.push(Message::assistant(answer.as_str()));
                state.journal.record(question, &answer);
                self.persist(&mut state);
                Ok(answer)
            }
            Err(err) => {
                warn!(error = %err, "Agent turn failed");
                self.persist(&mut state);
                Err(err.into())
            }
        }
    }

    /// Archive the current chat and start a fresh one. Returns the welcome text.
    pub async fn new_chat(&self) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(SessionError::NewChatWhileInFlight);
        }
        state.chat.archive_current(now_millis());
        state.chat.current_chat_id = new_chat_id();
        state.chat.messages = vec![Message::system(self.system_prompt())];
        state.journal.clear();
        self.persist(&mut state);

        debug!(chat_id = %state.chat.current_chat_id, "Started new chat");
        Ok(self.welcome_message())
    }

    /// Archive the current chat and switch to `chat_id` from history.
    pub async fn load_chat(&self, chat_id: &str) -> Result<Vec<TranscriptLine>, SessionError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(SessionError::SwitchWhileInFlight);
        }
        state.chat.archive_current(now_millis());
        let entry = state
            .chat
            .find_chat(chat_id)
            .cloned()
            .ok_or_else(|| SessionError::ChatNotFound(chat_id.to_string()))?;

        state.chat.current_chat_id = entry.id;
        state.chat.messages = entry.messages;
        state.journal.clear();
        self.persist(&mut state);

        Ok(transcript_of(&state.chat.messages))
    }

    /// Archived chats, newest first. Available while a turn is running.
    pub async fn history(&self) -> Vec<HistoryItem> {
        let state = self.state.lock().await;
        state
            .chat
            .history_newest_first()
            .into_iter()
            .map(|entry| HistoryItem {
                id: entry.id.clone(),
                title: entry.title.clone(),
                timestamp: entry.timestamp,
                is_current: entry.id == state.chat.current_chat_id,
            })
            .collect()
    }

    /// Replace any guide context with the guide `guide_id`.
    pub async fn apply_guide(&self, guide_id: &str) -> Result<&'static Guide, SessionError> {
        let guide =
            find_guide(guide_id).ok_or_else(|| SessionError::GuideNotFound(guide_id.to_string()))?;

        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(SessionError::RequestInFlight);
        }
        let messages = &mut state.chat.messages;
        messages.retain(|m| !m.is_system_with_prefix(GUIDE_CONTEXT_PREFIX));
        let insert_at = messages
            .iter()
            .position(|m| m.role == Role::System)
            .map_or(0, |idx| idx + 1);
        messages.insert(insert_at, Message::system(guide.context_message()));
        self.persist(&mut state);

        info!(guide = guide.id, "Applied guide context");
        Ok(guide)
    }

    /// Drop the guide context, if any.
    pub async fn clear_guide(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(SessionError::RequestInFlight);
        }
        state
            .chat
            .messages
            .retain(|m| !m.is_system_with_prefix(GUIDE_CONTEXT_PREFIX));
        self.persist(&mut state);
        Ok(())
    }

    /// User and non-empty assistant messages of the current chat.
    pub async fn transcript(&self) -> Vec<TranscriptLine> {
        transcript_of(&self.state.lock().await.chat.messages)
    }

    /// Snapshot of the current conversation.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.chat.messages.clone()
    }

    pub async fn current_chat_id(&self) -> String {
        self.state.lock().await.chat.current_chat_id.clone()
    }

    /// Memory journal entries, oldest first.
    pub async fn memory_entries(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.journal.entries().map(str::to_string).collect()
    }

    fn persist(&self, state: &mut SessionState) {
        state.chat.archive_current(now_millis());
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&state.chat) {
            warn!(error = %err, "Failed to save chat state");
        }
    }
}

fn system_prompt_for(registry: &ToolRegistry) -> String {
    default_system_prompt(
        registry.is_configured(BackendKind::GoogleDrive),
        registry.is_configured(BackendKind::OneDrive),
        registry.drive_root_folder(),
    )
}

fn transcript_of(messages: &[Message]) -> Vec<TranscriptLine> {
    messages
        .iter()
        .filter_map(|m| match m.role {
            Role::User => Some(TranscriptLine {
                is_user: true,
                text: m.text().to_string(),
            }),
            Role::Assistant if !m.text().is_empty() => Some(TranscriptLine {
                is_user: false,
                text: m.text().to_string(),
            }),
            _ => None,
        })
        .collect()
}

fn new_chat_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
