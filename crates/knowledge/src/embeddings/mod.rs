//! Embedding generation for the course index.
//!
//! Provider-agnostic: the vector store only sees [`EmbeddingProvider`].

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
