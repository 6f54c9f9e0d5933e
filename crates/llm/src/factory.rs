//! LLM provider factory.
//!
//! This module creates LLM clients from the configured provider name,
//! endpoint and API key.

use crate::client::LlmClient;
use crate::providers::{AnthropicClient, OllamaClient};
use crate::types::ProviderType;
use std::sync::Arc;
use tutor_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("anthropic", "claude", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by Anthropic)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown LLM provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Anthropic => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(
                    "Anthropic provider requires an API key (set ANTHROPIC_API_KEY)".to_string(),
                )
            })?;
            Ok(Arc::new(AnthropicClient::with_base_url(base_url, key)))
        }
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(base_url))),
    }
}
