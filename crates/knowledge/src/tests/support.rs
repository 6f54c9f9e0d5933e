//! Test doubles shared by the unit and scenario tests.

use crate::vector_index::{Collection, IndexFilter, IndexHit, IndexRecord, VectorIndex};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tutor_core::{AppError, AppResult};
use tutor_llm::{ContentBlock, LlmClient, LlmRequest, LlmResponse, LlmUsage, StopReason};

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedLlmClient {
    responses: Mutex<VecDeque<LlmResponse>>,
    repeat: Option<LlmResponse>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlmClient {
    pub(crate) fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with the same response.
    pub(crate) fn repeating(response: LlmResponse) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.repeat.clone())
            .ok_or_else(|| AppError::Generation("scripted client has no more responses".to_string()))
    }
}

/// A response that says a few words and requests the given tool calls.
pub(crate) fn tool_call_response(calls: &[(&str, &str, Value)]) -> LlmResponse {
    let mut content = vec![ContentBlock::text("Let me search.")];
    content.extend(calls.iter().map(|(id, name, input)| ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: input.clone(),
    }));

    LlmResponse {
        content,
        model: "scripted".to_string(),
        stop_reason: StopReason::ToolUse,
        usage: LlmUsage::default(),
    }
}

/// An index whose backend is always unreachable.
pub(crate) struct UnreachableIndex;

fn offline<T>() -> AppResult<T> {
    Err(AppError::SearchBackend("index unreachable".to_string()))
}

#[async_trait]
impl VectorIndex for UnreachableIndex {
    async fn upsert(&self, _collection: Collection, _records: Vec<IndexRecord>) -> AppResult<()> {
        offline()
    }

    async fn query(
        &self,
        _collection: Collection,
        _embedding: &[f32],
        _filter: &IndexFilter,
        _top_k: usize,
    ) -> AppResult<Vec<IndexHit>> {
        offline()
    }

    async fn get(&self, _collection: Collection, _id: &str) -> AppResult<Option<IndexRecord>> {
        offline()
    }

    async fn list(&self, _collection: Collection) -> AppResult<Vec<IndexRecord>> {
        offline()
    }

    async fn replace_course(
        &self,
        _course_title: &str,
        _catalog: IndexRecord,
        _content: Vec<IndexRecord>,
    ) -> AppResult<()> {
        offline()
    }

    async fn count(&self, _collection: Collection) -> AppResult<usize> {
        offline()
    }

    async fn clear(&self) -> AppResult<()> {
        offline()
    }
}
