//! Tool contract, registry and per-query dispatcher.

use crate::rag::types::Source;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tutor_core::{AppError, AppResult};
use tutor_llm::ToolDefinition;

/// Text handed back to the model plus the sources it should be credited with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Output that contributes no sources.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// A capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema offered to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the model-supplied parameters.
    ///
    /// Not-found conditions are reported in the output text. Errors are
    /// reserved for malformed parameters (`Generation`) and unreachable
    /// backends (`SearchBackend`).
    async fn execute(&self, input: &Value) -> AppResult<ToolOutput>;
}

/// Name-keyed set of tools, shared by every query.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name from its definition.
    ///
    /// A tool registered under an existing name replaces the old one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> AppResult<()> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(AppError::Config(
                "Tool definition must have a name".to_string(),
            ));
        }

        tracing::debug!("Registered tool: {}", name);
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Definitions of every registered tool, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Dispatches tool calls for a single query and collects their sources.
pub struct ToolManager {
    registry: Arc<ToolRegistry>,
    sources: Vec<Source>,
}

impl ToolManager {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            sources: Vec::new(),
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub fn has_tools(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Execute a tool by name and return its text for the model.
    ///
    /// The tool's sources are appended to those gathered so far. An unknown
    /// tool name is a generation error, and so is a backend failure inside
    /// the tool: both end the turn.
    pub async fn execute_tool(&mut self, name: &str, input: &Value) -> AppResult<String> {
        let tool = self.registry.get(name).ok_or_else(|| {
            AppError::Generation(format!("Model requested unknown tool '{}'", name))
        })?;

        tracing::debug!("Executing tool {} with input {}", name, input);

        let output = tool.execute(input).await.map_err(|e| match e {
            AppError::SearchBackend(msg) => AppError::Generation(format!(
                "search backend failed during tool call: {}",
                msg
            )),
            other => other,
        })?;

        self.sources.extend(output.sources);
        Ok(output.text)
    }

    /// Sources gathered since the last reset.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Drain the gathered sources, leaving the manager empty.
    pub fn take_sources(&mut self) -> Vec<Source> {
        std::mem::take(&mut self.sources)
    }

    pub fn reset_sources(&mut self) {
        self.sources.clear();
    }
}
