//! ChatSession behaviour against a scripted completion client

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cirrus_ai::llm::{MockLlmClient, MockStep};
use cirrus_ai::tools::Result as ToolResult;
use cirrus_ai::{
    AiError, BackendKind, DriveLocation, Message, Notifier, ReadOptions, Role, StorageBackend,
    ToolCall, ToolRegistry, noop_notifier,
};
use cirrus_core::{ChatSession, GUIDE_CONTEXT_PREFIX, SessionError, TranscriptLine};
use cirrus_storage::{ChatState, Storage};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

struct FakeDrive;

#[async_trait]
impl StorageBackend for FakeDrive {
    fn kind(&self) -> BackendKind {
        BackendKind::GoogleDrive
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn list_files(&self, _folder: Option<&str>, _loc: &DriveLocation) -> ToolResult<String> {
        Ok(r#"{"files":[]}"#.to_string())
    }

    async fn search_files(&self, query: &str, _loc: &DriveLocation) -> ToolResult<String> {
        Ok(format!(r#"{{"files":[{{"id":"f1","name":"{query}.xlsx"}}]}}"#))
    }

    async fn read_file(&self, file_id: &str, _options: &ReadOptions) -> ToolResult<String> {
        Ok(format!(r#"{{"file":{{"id":"{file_id}"}},"content":"42"}}"#))
    }
}

fn session_with(steps: Vec<MockStep>) -> (ChatSession, Arc<MockLlmClient>) {
    let llm = Arc::new(MockLlmClient::from_steps("mock-model", steps));
    let session = ChatSession::new(llm.clone(), Arc::new(ToolRegistry::new()));
    (session, llm)
}

async fn send(session: &ChatSession, text: &str) -> Result<String, SessionError> {
    session
        .send(text, &noop_notifier(), &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_send_appends_turn_and_records_memory() {
    let (session, _llm) = session_with(vec![MockStep::text("Hello!")]);

    let answer = send(&session, "  hi  ").await.unwrap();
    assert_eq!(answer, "Hello!");

    let messages = session.messages().await;
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(messages[1].text(), "hi");
    assert_eq!(session.memory_entries().await, vec!["Q: hi\nA: Hello!".to_string()]);

    let history = session.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "hi");
    assert!(history[0].is_current);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (session, llm) = session_with(vec![MockStep::text("ok")]);

    assert!(matches!(
        send(&session, "   ").await,
        Err(SessionError::EmptyMessage)
    ));
    assert_eq!(llm.call_count(), 0);
    assert!(!session.is_busy());
    assert_eq!(send(&session, "real").await.unwrap(), "ok");
}

#[tokio::test]
async fn test_failed_turn_keeps_question_and_skips_memory() {
    let (session, _llm) = session_with(vec![MockStep::error("provider down")]);

    let err = send(&session, "anyone there?").await.unwrap_err();
    assert!(matches!(err, SessionError::Agent(AiError::Llm(_))));

    let messages = session.messages().await;
    assert_eq!(messages.last().unwrap().role, Role::User);
    assert!(session.memory_entries().await.is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_concurrent_requests_are_rejected() {
    let (session, _llm) = session_with(vec![MockStep::text("slow answer").with_delay(300)]);
    let session = Arc::new(session);

    let first = {
        let session = session.clone();
        tokio::spawn(async move { send(&session, "first").await })
    };
    while !session.is_busy() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        send(&session, "second").await,
        Err(SessionError::RequestInFlight)
    ));
    assert!(matches!(
        session.new_chat().await,
        Err(SessionError::NewChatWhileInFlight)
    ));
    assert!(matches!(
        session.load_chat("anything").await,
        Err(SessionError::SwitchWhileInFlight)
    ));

    assert_eq!(first.await.unwrap().unwrap(), "slow answer");
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_reads_are_served_while_a_turn_runs() {
    let (session, _llm) = session_with(vec![MockStep::text("slow answer").with_delay(1_000)]);
    let session = Arc::new(session);

    let first = {
        let session = session.clone();
        tokio::spawn(async move { send(&session, "first").await })
    };

    // The question is saved before the completion starts.
    let history = tokio::time::timeout(Duration::from_millis(500), async {
        loop {
            let history = session.history().await;
            if !history.is_empty() {
                return history;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("history should not wait for the running turn");
    assert_eq!(history[0].title, "first");
    assert!(session.is_busy());

    let transcript = tokio::time::timeout(Duration::from_millis(200), session.transcript())
        .await
        .expect("transcript should not wait for the running turn");
    assert_eq!(
        transcript,
        vec![TranscriptLine {
            is_user: true,
            text: "first".to_string()
        }]
    );
    assert!(matches!(
        session.apply_guide("factory_reset_windows_pc").await,
        Err(SessionError::RequestInFlight)
    ));

    assert_eq!(first.await.unwrap().unwrap(), "slow answer");
    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].text, "slow answer");
}

#[tokio::test]
async fn test_tool_turn_runs_through_registry() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock-model",
        vec![
            MockStep::tool_calls(vec![ToolCall::new(
                "call_1",
                "search_drive_files",
                r#"{"query":"budget"}"#,
            )]),
            MockStep::text("Budget is in budget.xlsx."),
        ],
    ));
    let registry = Arc::new(ToolRegistry::new().with_google_drive(Arc::new(FakeDrive)));
    let session = ChatSession::new(llm, registry);
    assert!(session.has_drive());
    assert!(session.system_prompt().contains("search_drive_files"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let notify: Notifier = Arc::new(move |text: &str| sink.lock().unwrap().push(text.to_string()));

    let answer = session
        .send("where is the budget", &notify, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(answer, "Budget is in budget.xlsx.");

    let messages = session.messages().await;
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert!(messages[3].text().contains("budget.xlsx"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["Searching Drive...".to_string(), "Thinking...".to_string()]
    );
}

#[tokio::test]
async fn test_new_chat_archives_and_resets() {
    let (session, _llm) = session_with(vec![MockStep::text("first answer")]);
    send(&session, "first question").await.unwrap();
    let old_id = session.current_chat_id().await;

    let welcome = session.new_chat().await.unwrap();
    assert_eq!(welcome, "Welcome to Cirrus. Cloud storage access is not configured yet.");

    let messages = session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::System);
    assert_ne!(session.current_chat_id().await, old_id);
    assert!(session.memory_entries().await.is_empty());

    let history = session.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, old_id);
    assert!(!history[0].is_current);
}

#[tokio::test]
async fn test_load_chat_switches_conversation() {
    let (session, _llm) = session_with(vec![
        MockStep::text("answer A"),
        MockStep::text("answer B"),
    ]);
    send(&session, "question A").await.unwrap();
    let chat_a = session.current_chat_id().await;

    session.new_chat().await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    send(&session, "question B").await.unwrap();

    let transcript = session.load_chat(&chat_a).await.unwrap();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[0].is_user);
    assert_eq!(transcript[0].text, "question A");
    assert_eq!(transcript[1].text, "answer A");

    assert_eq!(session.current_chat_id().await, chat_a);
    assert!(session.memory_entries().await.is_empty());

    let history = session.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, chat_a);
    assert!(history[0].is_current);
    assert_eq!(history[1].title, "question B");

    assert!(matches!(
        session.load_chat("missing").await,
        Err(SessionError::ChatNotFound(_))
    ));
}

#[tokio::test]
async fn test_guides_replace_single_context_message() {
    let (session, _llm) = session_with(Vec::new());

    session.apply_guide("factory_reset_windows_pc").await.unwrap();
    session.apply_guide("factory_reset_windows_pc").await.unwrap();

    let messages = session.messages().await;
    let guide_messages: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_system_with_prefix(GUIDE_CONTEXT_PREFIX))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(guide_messages, vec![1]);

    session.clear_guide().await.unwrap();
    assert!(
        !session
            .messages()
            .await
            .iter()
            .any(|m| m.is_system_with_prefix(GUIDE_CONTEXT_PREFIX))
    );

    assert!(matches!(
        session.apply_guide("nope").await,
        Err(SessionError::GuideNotFound(_))
    ));
}

#[tokio::test]
async fn test_state_is_persisted_and_restored() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("cirrus.db");

    let chat_id = {
        let storage = Storage::new(&db_path).unwrap();
        let llm = Arc::new(MockLlmClient::from_steps("m", vec![MockStep::text("stored")]));
        let session = ChatSession::new(llm, Arc::new(ToolRegistry::new()))
            .with_store(storage.chat_state);
        assert!(!session.restore().await);
        send(&session, "remember me").await.unwrap();
        session.current_chat_id().await
    };

    let storage = Storage::new(&db_path).unwrap();
    let session = ChatSession::new(Arc::new(MockLlmClient::new("m")), Arc::new(ToolRegistry::new()))
        .with_store(storage.chat_state);

    assert!(session.restore().await);
    assert_eq!(session.current_chat_id().await, chat_id);
    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].text, "stored");
    assert!(session.memory_entries().await.is_empty());
    assert_eq!(session.history().await.len(), 1);
}

#[tokio::test]
async fn test_restore_adds_missing_system_prompt() {
    let dir = tempdir().unwrap();
    let storage = Storage::new(dir.path().join("cirrus.db")).unwrap();
    storage
        .chat_state
        .save(&ChatState::new("chat-x", vec![Message::user("orphan")]))
        .unwrap();

    let session = ChatSession::new(Arc::new(MockLlmClient::new("m")), Arc::new(ToolRegistry::new()))
        .with_store(storage.chat_state);

    assert!(session.restore().await);
    let messages = session.messages().await;
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].text(), session.system_prompt());
    assert_eq!(messages[1].text(), "orphan");
}
