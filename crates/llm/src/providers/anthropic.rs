//! Anthropic LLM provider implementation.
//!
//! Messages API: https://docs.anthropic.com/en/api/messages

use crate::client::{
    ContentBlock, LlmClient, LlmRequest, LlmResponse, LlmUsage, Message, StopReason,
    ToolDefinition,
};
use crate::types::ANTHROPIC_DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use tutor_core::{AppError, AppResult};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 800;
const MAX_ATTEMPTS: u32 = 3;

/// Anthropic API request format.
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Anthropic API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    /// Base URL for the API
    base_url: String,

    /// Value of the `x-api-key` header
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client against the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ANTHROPIC_DEFAULT_ENDPOINT, api_key)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Convert LlmRequest to Anthropic format.
    fn to_anthropic_request<'a>(&self, request: &'a LlmRequest) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: &request.tools,
            tool_choice: request
                .offers_tools()
                .then_some(ToolChoice { kind: "auto" }),
            temperature: request.temperature,
        }
    }

    /// Convert Anthropic response to LlmResponse.
    fn convert_response(&self, response: AnthropicResponse) -> LlmResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicBlock::Text { text } => Some(ContentBlock::Text { text }),
                AnthropicBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                AnthropicBlock::Unsupported => None,
            })
            .collect();

        let stop_reason = match response.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") | None => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some(_) => StopReason::Other,
        };

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        LlmResponse {
            content,
            model: response.model,
            stop_reason,
            usage,
        }
    }
}

/// Rate limits and server-side failures are worth another attempt.
fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(provider = "anthropic", model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            model = %request.model,
            tools = request.tools.len(),
            messages = request.messages.len(),
            "Sending completion request to Anthropic"
        );

        let body = self.to_anthropic_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    AppError::Generation(format!("Failed to send request to Anthropic: {}", e))
                })?;

            let status = response.status();
            if status.is_success() {
                break response;
            }

            if is_retryable(status) && attempt < MAX_ATTEMPTS {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                tracing::warn!(%status, attempt, ?delay, "Anthropic request failed, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        };

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Failed to parse Anthropic response: {}", e))
        })?;

        tracing::debug!(
            stop_reason = ?anthropic_response.stop_reason,
            "Received completion from Anthropic"
        );

        Ok(self.convert_response(anthropic_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials".to_string(),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }
    }

    #[test]
    fn test_anthropic_client_creation() {
        let client = AnthropicClient::with_base_url("https://example.test/", "key");
        assert_eq!(client.provider_name(), "anthropic");
        assert_eq!(client.base_url, "https://example.test");
    }

    #[test]
    fn test_request_conversion_with_tools() {
        let client = AnthropicClient::new("key");
        let request = LlmRequest::new("claude-test", vec![Message::user("What is MCP?")])
            .with_system("You are a course assistant")
            .with_tools(vec![search_tool()])
            .with_temperature(0.0);

        let value = serde_json::to_value(client.to_anthropic_request(&request)).unwrap();
        assert_eq!(value["model"], "claude-test");
        assert_eq!(value["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(value["system"], "You are a course assistant");
        assert_eq!(value["tool_choice"]["type"], "auto");
        assert_eq!(value["tools"][0]["name"], "search_course_content");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
    }

    #[test]
    fn test_request_without_tools_omits_tool_fields() {
        let client = AnthropicClient::new("key");
        let request = LlmRequest::new("claude-test", vec![Message::user("hi")]);
        let value = serde_json::to_value(client.to_anthropic_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
        assert!(value.get("system").is_none());
    }

    #[test]
    fn test_response_conversion() {
        let client = AnthropicClient::new("key");
        let raw: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude-test",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Searching."},
                {"type": "thinking", "thinking": "..."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_course_content",
                 "input": {"query": "agents"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 8}
        }))
        .unwrap();

        let response = client.convert_response(raw);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.content.len(), 2);
        assert_eq!(response.text(), "Searching.");
        assert_eq!(response.tool_calls()[0].input["query"], "agents");
        assert_eq!(response.usage.total_tokens, 20);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(reqwest::StatusCode::UNAUTHORIZED));
    }
}
