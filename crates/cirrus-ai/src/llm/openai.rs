//! OpenAI-compatible chat completions provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, CompletionResponse, LlmClient, Message, ToolCall,
};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    project: Option<String>,
    organization: Option<String>,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project: None,
            organization: None,
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send requests on behalf of an OpenAI project
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Send requests on behalf of an OpenAI organization
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIMessageToolCall>>,
}

#[derive(Serialize)]
struct OpenAIMessageToolCall {
    id: String,
    r#type: &'static str,
    function: OpenAIMessageFunction,
}

#[derive(Serialize)]
struct OpenAIMessageFunction {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct OpenAITool {
    r#type: &'static str,
    function: OpenAIFunction,
}

#[derive(Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIResponseMessage>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<OpenAIFunctionCall>,
}

#[derive(Deserialize)]
struct OpenAIFunctionCall {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

fn to_openai_message(m: &Message) -> OpenAIMessage {
    let tool_calls = m.tool_calls.as_ref().map(|tcs| {
        tcs.iter()
            .map(|tc| OpenAIMessageToolCall {
                id: tc.id.clone(),
                r#type: "function",
                function: OpenAIMessageFunction {
                    name: tc.name.clone(),
                    arguments: tc.arguments.clone(),
                },
            })
            .collect()
    });

    OpenAIMessage {
        role: m.role.as_str(),
        content: m.content.clone(),
        tool_call_id: m.tool_call_id.clone(),
        tool_calls,
    }
}

/// Pull `error.message` out of a provider error body, falling back to a generic text.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Request failed.".to_string())
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if self.api_key.trim().is_empty() {
            return Err(AiError::MissingCredentials);
        }

        let messages: Vec<OpenAIMessage> = request.messages.iter().map(to_openai_message).collect();

        let tools: Option<Vec<OpenAITool>> = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAITool {
                        r#type: "function",
                        function: OpenAIFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        let body = OpenAIRequest {
            model: self.model.clone(),
            messages,
            tools,
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(project) = &self.project {
            builder = builder.header("OpenAI-Project", project);
        }
        if let Some(organization) = &self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map(Vec::len).unwrap_or(0),
            "Sending chat completion request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AiError::LlmHttp {
                status: status.as_u16(),
                message: provider_error_message(&text),
            });
        }

        let data: OpenAIResponse = serde_json::from_str(&text)?;
        let message = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or(AiError::NoMessage)?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let function = tc.function.unwrap_or(OpenAIFunctionCall {
                    name: None,
                    arguments: None,
                });
                ToolCall {
                    id: tc.id.unwrap_or_default(),
                    name: function.name.unwrap_or_default(),
                    arguments: function.arguments.unwrap_or_default(),
                }
            })
            .collect();

        Ok(CompletionResponse {
            content: message.content,
            tool_calls,
        })
    }
}
