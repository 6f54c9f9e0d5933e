//! Tutor Core Library
//!
//! This crate provides the foundational utilities for the tutor workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ChatSettings, EmbeddingSettings, KnowledgeSettings, LlmSettings};
pub use error::{AppError, AppResult};
