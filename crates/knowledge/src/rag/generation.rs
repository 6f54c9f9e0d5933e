//! The tool-calling loop between the model and the registered tools.
//!
//! ```text
//! AwaitingModel --tool calls--> ToolCallPending --results--> AwaitingModel
//!       |
//!       +--no tool calls--> Done(answer)
//! ```
//!
//! Tools are offered while fewer than `max_tool_rounds` rounds have run.
//! The request after the last permitted round carries no tools, so the
//! model has to answer.

use crate::rag::tools::ToolManager;
use std::collections::HashMap;
use std::sync::Arc;
use tutor_core::{AppError, AppResult, LlmSettings};
use tutor_llm::{LlmClient, LlmRequest, Message, ToolCall, ToolResult};
use tutor_prompt::{build_prompt, PromptDefinition, HISTORY_VAR, QUERY_VAR};

/// Prompt variable carrying the round limit.
const MAX_ROUNDS_VAR: &str = "maxRounds";

enum TurnState {
    AwaitingModel,
    ToolCallPending(Vec<ToolCall>),
    Done(String),
}

/// Drives one query turn against the injected [`LlmClient`].
pub struct GenerationOrchestrator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_tool_rounds: usize,
}

impl GenerationOrchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        llm: &LlmSettings,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            client,
            prompt,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            max_tool_rounds,
        }
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Answer `query`, letting the model call tools through `tools`.
    ///
    /// Sources gathered by the tool calls stay in `tools` for the caller to
    /// drain. Any model failure, malformed tool call or backend failure
    /// ends the turn with an error.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &mut ToolManager,
    ) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert(QUERY_VAR.to_string(), query.to_string());
        variables.insert(MAX_ROUNDS_VAR.to_string(), self.max_tool_rounds.to_string());
        if let Some(history) = history {
            variables.insert(HISTORY_VAR.to_string(), history.to_string());
        }
        let prompt = build_prompt(&self.prompt, variables)?;

        let mut messages = vec![Message::user(prompt.user)];
        let mut rounds = 0usize;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    let offer_tools = rounds < self.max_tool_rounds && tools.has_tools();

                    let mut request = LlmRequest::new(&self.model, messages.clone())
                        .with_temperature(self.temperature)
                        .with_max_tokens(self.max_tokens);
                    if let Some(system) = &prompt.system {
                        request = request.with_system(system.clone());
                    }
                    if offer_tools {
                        request = request.with_tools(tools.definitions());
                    }

                    tracing::debug!(
                        "Model request: round {}, {} messages, tools offered: {}",
                        rounds,
                        messages.len(),
                        offer_tools
                    );
                    let response = self.client.complete(&request).await?;

                    let calls = response.tool_calls();
                    if offer_tools && !calls.is_empty() {
                        messages.push(Message::assistant(response.content));
                        TurnState::ToolCallPending(calls)
                    } else {
                        if !calls.is_empty() {
                            tracing::warn!(
                                "Ignoring {} tool calls requested after the final round",
                                calls.len()
                            );
                        }
                        TurnState::Done(response.text())
                    }
                }

                TurnState::ToolCallPending(calls) => {
                    rounds += 1;
                    tracing::info!("Tool round {}: {} call(s)", rounds, calls.len());

                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        let content = tools.execute_tool(&call.name, &call.input).await?;
                        results.push(ToolResult {
                            tool_use_id: call.id,
                            content,
                        });
                    }
                    messages.push(Message::tool_results(results));
                    TurnState::AwaitingModel
                }

                TurnState::Done(answer) => {
                    if answer.trim().is_empty() {
                        return Err(AppError::Generation(
                            "Model returned an empty answer".to_string(),
                        ));
                    }
                    return Ok(answer);
                }
            };
        }
    }
}
