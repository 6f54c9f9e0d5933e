//! LLM provider types.

/// Default Anthropic Messages API endpoint.
pub const ANTHROPIC_DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Default local Ollama endpoint.
pub const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Anthropic,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    /// Endpoint used when none is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Anthropic => ANTHROPIC_DEFAULT_ENDPOINT,
            Self::Ollama => OLLAMA_DEFAULT_ENDPOINT,
        }
    }

    /// Whether an API key must be supplied.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Anthropic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("anthropic"), Some(ProviderType::Anthropic));
        assert_eq!(ProviderType::parse("Claude"), Some(ProviderType::Anthropic));
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("openai"), None);
    }

    #[test]
    fn test_provider_defaults() {
        assert!(ProviderType::Anthropic.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert_eq!(ProviderType::Ollama.default_endpoint(), OLLAMA_DEFAULT_ENDPOINT);
        assert_eq!(ProviderType::Anthropic.as_str(), "anthropic");
    }
}
