//! LLM module - completion client abstraction and the OpenAI provider

mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock_client;
mod openai;

pub use client::{CompletionRequest, CompletionResponse, LlmClient, Message, Role, ToolCall};
#[cfg(any(test, feature = "test-utils"))]
pub use mock_client::{MockLlmClient, MockStep, MockStepKind};
pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIClient};
