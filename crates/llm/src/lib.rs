//! LLM integration crate for the tutor workspace.
//!
//! This crate provides a provider-agnostic abstraction for tool-calling
//! language models. The course assistant talks to the model only through the
//! [`LlmClient`] trait, so the provider can be swapped or replaced by a test
//! double.
//!
//! # Providers
//! - **Anthropic**: Messages API (default)
//! - **Ollama**: Local LLM runtime via `/api/chat`
//!
//! # Example
//! ```no_run
//! use tutor_llm::{LlmClient, LlmRequest, Message, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("llama3.2", vec![Message::user("Hello, world!")]);
//! let response = client.complete(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ContentBlock, LlmClient, LlmRequest, LlmResponse, LlmUsage, Message, Role, StopReason,
    ToolCall, ToolDefinition, ToolResult,
};
pub use factory::create_client;
pub use providers::{AnthropicClient, OllamaClient};
pub use types::ProviderType;
