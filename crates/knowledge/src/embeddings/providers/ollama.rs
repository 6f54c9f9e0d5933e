//! Ollama Embedding Provider
//!
//! Provides semantic embeddings via Ollama's local API using models like nomic-embed-text.
//!
//! # Features
//! - Neural semantic embeddings (768-dim for nomic-embed-text)
//! - Local-first (no API costs, privacy-preserving)
//! - Automatic retry with exponential backoff
//!
//! # Example
//! ```no_run
//! use tutor_core::EmbeddingSettings;
//! use tutor_knowledge::embeddings::EmbeddingProvider;
//! use tutor_knowledge::embeddings::providers::OllamaProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = EmbeddingSettings {
//!     provider: "ollama".to_string(),
//!     model: "nomic-embed-text".to_string(),
//!     dimensions: 768,
//!     ..Default::default()
//! };
//!
//! let provider = OllamaProvider::new(&settings)?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use tutor_core::{AppError, AppResult, EmbeddingSettings};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Maximum attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Arc<Client>,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider from embedding settings.
    ///
    /// The endpoint defaults to `http://localhost:11434`.
    pub fn new(settings: &EmbeddingSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::SearchBackend(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Arc::new(client),
            base_url,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        })
    }

    /// Verify Ollama connection and model availability
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        match self.embed_with_retries("test connection", MAX_RETRIES).await {
            Ok(_) => {
                debug!("Ollama connection verified, model '{}' ready", self.model);
                Ok(())
            }
            Err(e) => {
                error!("Failed to connect to Ollama: {}", e);
                Err(AppError::SearchBackend(format!(
                    "Ollama not available at {} ({}). Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                    self.base_url, e, self.model, self.model
                )))
            }
        }
    }

    /// Embed single text with retry logic
    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_with_retries(&self, text: &str, retries: u32) -> AppResult<Vec<f32>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < retries {
            match self.embed_single(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < retries {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, retries, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::SearchBackend("Unknown embedding error".to_string())))
    }

    /// Embed single text (no retries)
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::SearchBackend(format!("Failed to send request to Ollama: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error)
                .unwrap_or(error_text);
            return Err(AppError::SearchBackend(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let response_body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::SearchBackend(format!("Failed to parse Ollama response: {}", e))
        })?;

        check_dimensions(&response_body.embedding, self.dimensions)?;
        Ok(response_body.embedding)
    }
}

fn check_dimensions(embedding: &[f32], expected: usize) -> AppResult<()> {
    if embedding.len() != expected {
        return Err(AppError::SearchBackend(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimensions]);
        }

        self.embed_with_retries(text, MAX_RETRIES).await
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // The embeddings endpoint takes one prompt per request
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_provider_from_settings() {
        let provider = OllamaProvider::new(&settings(Some("http://ollama.local:11434/"))).unwrap();
        assert_eq!(provider.base_url, "http://ollama.local:11434");
        assert_eq!(provider.dimensions(), 768);
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_default_endpoint() {
        let provider = OllamaProvider::new(&settings(None)).unwrap();
        assert_eq!(provider.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_dimension_check() {
        assert!(check_dimensions(&[0.0; 3], 3).is_ok());
        assert!(matches!(
            check_dimensions(&[0.0; 2], 3),
            Err(AppError::SearchBackend(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_text_needs_no_request() {
        // Port 9 is discard; a request would fail
        let provider = OllamaProvider::new(&settings(Some("http://127.0.0.1:9"))).unwrap();
        let embedding = provider.embed("   ").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_error() {
        let provider = OllamaProvider::new(&settings(Some("http://127.0.0.1:9"))).unwrap();
        let result = provider.verify_connection().await;
        assert!(matches!(result, Err(AppError::SearchBackend(_))));
    }
}
