//! Deterministic mock LLM client for agent and session tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::{AiError, Result};

use super::{CompletionRequest, CompletionResponse, LlmClient, Message, Role, ToolCall};

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Return a plain assistant message.
    Text(String),
    /// Return a response carrying the given tool calls.
    ToolCalls(Vec<ToolCall>),
    /// Return an LLM error.
    Error(String),
}

/// Scripted completion step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::tool_calls(vec![ToolCall::new(id, name, arguments)])
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::ToolCalls(calls),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// When the script runs dry it echoes the last user message, or repeats the
/// `repeat` step forever when one is configured.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    repeat: Option<MockStep>,
    calls: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            ..Self::default()
        }
    }

    /// Answer every request with `step` once the script is exhausted.
    pub fn repeating(model: impl Into<String>, step: MockStep) -> Self {
        Self {
            model: model.into(),
            repeat: Some(step),
            ..Self::default()
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    /// Number of completion requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists of every request, in arrival order.
    pub async fn captured_requests(&self) -> Vec<Vec<Message>> {
        self.captured.lock().await.clone()
    }

    async fn next_step(&self) -> Option<MockStep> {
        let scripted = self.script.lock().await.pop_front();
        scripted.or_else(|| self.repeat.clone())
    }

    fn fallback_response(request: &CompletionRequest) -> CompletionResponse {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| format!("mock-echo: {}", msg.text()))
            .unwrap_or_else(|| "mock-ok".to_string());
        CompletionResponse::text(text)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.captured.lock().await.push(request.messages.clone());

        let Some(step) = self.next_step().await else {
            return Ok(Self::fallback_response(&request));
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        match step.kind {
            MockStepKind::Text(content) => Ok(CompletionResponse::text(content)),
            MockStepKind::ToolCalls(calls) => Ok(CompletionResponse::with_tool_calls(calls)),
            MockStepKind::Error(message) => Err(AiError::Llm(message)),
        }
    }
}
