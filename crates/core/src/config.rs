//! Configuration management for the tutor CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.tutor/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with optional state stored in `.tutor/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers accepted for answer generation.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["anthropic", "ollama"];

/// Providers accepted for embeddings.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .tutor/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// API key for the generation provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Generation model settings
    pub llm: LlmSettings,

    /// Chunking, indexing and retrieval settings
    pub knowledge: KnowledgeSettings,

    /// Embedding backend settings
    pub embedding: EmbeddingSettings,

    /// Conversation and tool-loop settings
    pub chat: ChatSettings,
}

/// Generation provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider name ("anthropic" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint (provider default when absent)
    pub endpoint: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens generated per model call
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            endpoint: None,
            temperature: 0.0,
            max_tokens: 800,
        }
    }
}

/// Document processing and vector search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Folder of course transcripts indexed at startup
    #[serde(rename = "docsPath")]
    pub docs_path: PathBuf,

    /// Maximum characters per chunk
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,

    /// Maximum search results returned to a tool call
    #[serde(rename = "maxResults")]
    pub max_results: usize,

    /// Minimum cosine similarity for course-name resolution
    #[serde(rename = "minResolveSimilarity")]
    pub min_resolve_similarity: f32,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            docs_path: PathBuf::from("docs"),
            chunk_size: 800,
            chunk_overlap: 100,
            max_results: 5,
            min_resolve_similarity: 0.2,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name ("trigram" or "ollama")
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom endpoint (provider default when absent)
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Exchanges (user + assistant pairs) remembered per session
    #[serde(rename = "maxHistory")]
    pub max_history: usize,

    /// Tool rounds allowed per query before a final answer is forced
    #[serde(rename = "maxToolRounds")]
    pub max_tool_rounds: usize,

    /// Prompt definition id
    pub prompt: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_history: 2,
            max_tool_rounds: 2,
            prompt: "course.assistant".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    knowledge: Option<KnowledgeSettings>,
    embedding: Option<EmbeddingSettings>,
    chat: Option<ChatSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            knowledge: KnowledgeSettings::default(),
            embedding: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `TUTOR_WORKSPACE`: Override workspace path
    /// - `TUTOR_CONFIG`: Path to config file
    /// - `TUTOR_PROVIDER`: Generation provider
    /// - `TUTOR_MODEL`: Model identifier
    /// - `TUTOR_API_KEY`: API key (falls back to `ANTHROPIC_API_KEY`)
    /// - `TUTOR_DOCS`: Course transcript folder
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use tutor_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Docs: {:?}", config.docs_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `TUTOR_WORKSPACE` and `TUTOR_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("TUTOR_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        if let Some(config_file) =
            config_file.or_else(|| std::env::var("TUTOR_CONFIG").ok().map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.tutor_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("TUTOR_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("TUTOR_MODEL") {
            config.llm.model = model;
        }

        if let Ok(docs) = std::env::var("TUTOR_DOCS") {
            config.knowledge.docs_path = PathBuf::from(docs);
        }

        config.api_key = std::env::var("TUTOR_API_KEY")
            .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(knowledge) = config_file.knowledge {
            result.knowledge = knowledge;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(chat) = config_file.chat {
            result.chat = chat;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .tutor directory.
    pub fn tutor_dir(&self) -> PathBuf {
        self.workspace.join(".tutor")
    }

    /// Resolve the transcript folder against the workspace.
    pub fn docs_dir(&self) -> PathBuf {
        if self.knowledge.docs_path.is_absolute() {
            self.knowledge.docs_path.clone()
        } else {
            self.workspace.join(&self.knowledge.docs_path)
        }
    }

    /// Validate configuration before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_LLM_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if provider == "anthropic" && self.api_key.is_none() {
            return Err(AppError::Config(
                "API key not found. Set TUTOR_API_KEY or ANTHROPIC_API_KEY".to_string(),
            ));
        }

        let embedding = self.embedding.provider.to_lowercase();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        let knowledge = &self.knowledge;
        if knowledge.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than zero".to_string()));
        }
        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                knowledge.chunk_overlap, knowledge.chunk_size
            )));
        }
        if knowledge.max_results == 0 {
            return Err(AppError::Config("maxResults must be greater than zero".to_string()));
        }

        Ok(())
    }
}
