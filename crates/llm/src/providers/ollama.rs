//! Ollama LLM provider implementation.
//!
//! This module provides integration with Ollama, a local LLM runtime, through
//! its chat endpoint, which supports tool calling.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{
    ContentBlock, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role, StopReason,
};
use crate::types::OLLAMA_DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use tutor_core::{AppError, AppResult};

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url(OLLAMA_DEFAULT_ENDPOINT)
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert LlmRequest to Ollama format.
    ///
    /// The system prompt becomes a leading `system` message. Tool results are
    /// sent as `tool` messages, one per result, in call order.
    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
                tool_calls: Vec::new(),
            });
        }

        for message in &request.messages {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let mut text = String::new();
            let mut tool_calls = Vec::new();

            for block in &message.content {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(t),
                    ContentBlock::ToolUse { name, input, .. } => {
                        tool_calls.push(OllamaToolCall {
                            function: OllamaFunctionCall {
                                name: name.clone(),
                                arguments: input.clone(),
                            },
                        })
                    }
                    ContentBlock::ToolResult { content, .. } => messages.push(OllamaMessage {
                        role: "tool".to_string(),
                        content: content.clone(),
                        tool_calls: Vec::new(),
                    }),
                }
            }

            if !text.is_empty() || !tool_calls.is_empty() {
                messages.push(OllamaMessage {
                    role: role.to_string(),
                    content: text,
                    tool_calls,
                });
            }
        }

        OllamaRequest {
            model: request.model.clone(),
            messages,
            tools: request
                .tools
                .iter()
                .map(|tool| OllamaTool {
                    kind: "function",
                    function: OllamaFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.input_schema.clone(),
                    },
                })
                .collect(),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }

    /// Convert Ollama response to LlmResponse.
    ///
    /// Ollama does not assign ids to tool calls, so positional ids are
    /// generated to pair results with calls.
    fn convert_response(&self, response: OllamaResponse) -> LlmResponse {
        let usage = LlmUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        );

        let mut content = Vec::new();
        if !response.message.content.is_empty() {
            content.push(ContentBlock::Text {
                text: response.message.content,
            });
        }
        let has_tool_calls = !response.message.tool_calls.is_empty();
        for (index, call) in response.message.tool_calls.into_iter().enumerate() {
            content.push(ContentBlock::ToolUse {
                id: format!("call_{}", index),
                name: call.function.name,
                input: call.function.arguments,
            });
        }

        LlmResponse {
            content,
            model: response.model,
            stop_reason: if has_tool_calls {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            },
            usage,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, request), fields(provider = "ollama", model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                AppError::Generation(format!("Failed to send request to Ollama: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        // For non-streaming, Ollama returns a single JSON object
        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::info!("Received completion from Ollama");
        tracing::debug!("Response: {:?}", ollama_response);

        Ok(self.convert_response(ollama_response))
    }
}
