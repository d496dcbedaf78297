//! One conversational turn: compaction, completion, tool dispatch.
//!
//! The loop mutates the caller's conversation in place. Compaction may replace
//! its contents wholesale; tool-call rounds append an assistant message and one
//! tool message per call. The final answer is returned, not appended, so the
//! host decides how to record it.
//!
//! Each completion request races the cancellation token and a timeout. Tool
//! calls run strictly in the order the model issued them.

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{AiError, Result};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message};
use crate::memory::{Compaction, MemoryJournal, compact_with_config};
use crate::text_utils::compress;
use crate::tools::{ToolRegistry, ToolSchema};

use super::Notifier;

pub use config::{
    AgentLoopConfig, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOOL_RESULT_MAX_CHARS, EMPTY_RESPONSE_PLACEHOLDER, THINKING_NOTICE,
};

/// Drives a single turn against a completion client and the tool registry.
pub struct AgentLoop {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    config: AgentLoopConfig,
}

impl AgentLoop {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            config: AgentLoopConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentLoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.config
    }

    /// Run until the model answers without tool calls or the budget runs out.
    pub async fn run(
        &self,
        conversation: &mut Vec<Message>,
        journal: &MemoryJournal,
        notify: &Notifier,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let schemas = self.tools.schemas();
        info!(
            model = %self.llm.model(),
            tools = schemas.len(),
            messages = conversation.len(),
            "Starting agent turn"
        );

        for iteration in 0..self.config.max_iterations {
            if cancel.is_cancelled() {
                return Err(AiError::Cancelled);
            }

            if let Compaction::Rebuilt(rebuilt) =
                compact_with_config(conversation, journal, &self.config.compaction)
            {
                *conversation = rebuilt;
            }

            let response = self.request_completion(conversation, &schemas, cancel).await?;

            if response.tool_calls.is_empty() {
                let answer = response
                    .content
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| EMPTY_RESPONSE_PLACEHOLDER.to_string());
                info!(iterations = iteration + 1, "Agent turn completed");
                return Ok(answer);
            }

            debug!(
                iteration,
                tool_calls = response.tool_calls.len(),
                "Executing tool calls"
            );

            let calls = response.tool_calls;
            conversation.push(Message::assistant_with_tool_calls(
                response.content,
                calls.clone(),
            ));

            for call in &calls {
                let output = self.tools.dispatch(call, notify).await;
                let bounded = compress(&output, self.config.tool_result_max_chars);
                conversation.push(Message::tool_result(call.id.clone(), bounded));
            }

            notify(THINKING_NOTICE);
        }

        Err(AiError::MaxIterations(self.config.max_iterations))
    }

    async fn request_completion(
        &self,
        conversation: &[Message],
        schemas: &[ToolSchema],
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse> {
        let request = CompletionRequest::new(conversation.to_vec()).with_tools(schemas.to_vec());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AiError::Cancelled),
            result = tokio::time::timeout(self.config.completion_timeout, self.llm.complete(request)) => {
                result.map_err(|_| AiError::Timeout)?
            }
        }
    }
}
