//! Prompt system for the tutor workspace.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (built-in, overridable per workspace)
//! - Handlebars template rendering for system and user messages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, HISTORY_VAR, QUERY_VAR};
pub use loader::{builtin_prompt, list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition};
