//! Cirrus AI - the conversational core of the Cirrus cloud-file assistant
//!
//! This crate provides:
//! - OpenAI-compatible completion client behind the `LlmClient` trait
//! - Tool schemas, request parsing and dispatch to storage backends
//! - Memory journal and conversation compaction
//! - The bounded agent loop that ties them together

pub mod agent;
pub mod error;
mod http_client;
pub mod llm;
pub mod memory;
pub mod text_utils;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentLoop, AgentLoopConfig, Notifier, noop_notifier};
pub use error::{AiError, Result};
pub use http_client::build_http_client;
pub use llm::{
    CompletionRequest, CompletionResponse, LlmClient, Message, OpenAIClient, Role, ToolCall,
};
pub use memory::{Compaction, MemoryJournal, compact_conversation};
pub use text_utils::compress;
pub use tools::{
    BackendKind, DriveLocation, ReadOptions, StorageBackend, ToolError, ToolKind, ToolRegistry,
    ToolRequest, ToolSchema,
};
