//! Prompt types for the tutor workspace.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    #[serde(default)]
    pub behavior: PromptBehavior,

    /// System instructions template (Handlebars)
    #[serde(default)]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

/// Behavioral settings for prompt execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Tone (e.g., "educational", "technical")
    #[serde(default)]
    pub tone: String,

    /// Style (e.g., "concise", "detailed")
    #[serde(default)]
    pub style: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether conversation history was rendered into the system message
    #[serde(rename = "historyIncluded")]
    pub history_included: bool,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        history_included: bool,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                history_included,
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: test.prompt
title: Test Prompt
apiVersion: "1.0"
createdBy: test
behavior:
  tone: educational
  style: concise
system: "You answer questions about {{topic}}."
template: "{{query}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "test.prompt");
        assert_eq!(def.behavior.tone, "educational");
        assert_eq!(
            def.system.as_deref(),
            Some("You answer questions about {{topic}}.")
        );
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = r#"
id: bare
title: Bare
apiVersion: "1.0"
template: "{{query}}"
"#;
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.system.is_none());
        assert!(def.behavior.style.is_empty());
        assert!(def.created_by.is_empty());
    }

    #[test]
    fn test_built_prompt_creation() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "test".to_string());

        let built = BuiltPrompt::new(
            Some("System message".to_string()),
            "User message".to_string(),
            "test.prompt".to_string(),
            true,
            vars,
        );

        assert_eq!(built.system, Some("System message".to_string()));
        assert_eq!(built.user, "User message");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert!(built.metadata.history_included);
    }
}
