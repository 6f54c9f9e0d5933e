//! Query orchestrator: the single entry point for ingesting transcripts and
//! answering questions.

use crate::document::{DocumentProcessor, ProcessedDocument};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::memory_index::InMemoryIndex;
use crate::rag::generation::GenerationOrchestrator;
use crate::rag::outline_tool::CourseOutlineTool;
use crate::rag::search_tool::CourseSearchTool;
use crate::rag::session::SessionManager;
use crate::rag::tools::{ToolManager, ToolRegistry};
use crate::rag::types::QueryResponse;
use crate::types::{CourseCatalog, CourseSummary, IngestStats, RawDocument};
use crate::vector_index::VectorIndex;
use crate::vector_store::VectorStore;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tutor_core::{AppConfig, AppError, AppResult};
use tutor_llm::{create_client, LlmClient};
use tutor_prompt::{load_prompt, PromptDefinition};
use walkdir::WalkDir;

/// File extensions picked up by folder ingestion.
const TRANSCRIPT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// What happened to a single ingested document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// The course was new or changed and has been (re)indexed
    Indexed { course_title: String, chunks: usize },

    /// The course is already indexed with identical content
    Unchanged { course_title: String },
}

/// Course assistant wiring: store, tools, sessions and the generation loop.
///
/// The session registry is created here and dropped with the system.
pub struct RagSystem {
    store: Arc<VectorStore>,
    processor: DocumentProcessor,
    sessions: SessionManager,
    registry: Arc<ToolRegistry>,
    generator: GenerationOrchestrator,
}

impl RagSystem {
    /// Build the system from configuration: model client, embedding
    /// provider, in-memory index and the configured prompt.
    pub async fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let client = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            config.api_key.as_deref(),
        )?;
        let embedder = create_provider(&config.embedding).await?;
        let prompt = load_prompt(&config.workspace, &config.chat.prompt)?;

        tracing::info!(
            "Course assistant ready (llm: {}/{}, embeddings: {}/{})",
            client.provider_name(),
            config.llm.model,
            embedder.provider_name(),
            embedder.model_name()
        );

        Self::with_components(
            config,
            client,
            embedder,
            Arc::new(InMemoryIndex::new()),
            prompt,
        )
    }

    /// Build the system from explicit collaborators.
    pub fn with_components(
        config: &AppConfig,
        client: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        prompt: PromptDefinition,
    ) -> AppResult<Self> {
        let store = Arc::new(VectorStore::new(index, embedder, &config.knowledge));

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(store.clone())))?;
        registry.register(Arc::new(CourseOutlineTool::new(store.clone())))?;

        Ok(Self {
            processor: DocumentProcessor::new(
                config.knowledge.chunk_size,
                config.knowledge.chunk_overlap,
            ),
            sessions: SessionManager::new(config.chat.max_history),
            registry: Arc::new(registry),
            generator: GenerationOrchestrator::new(
                client,
                prompt,
                &config.llm,
                config.chat.max_tool_rounds,
            ),
            store,
        })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer a question within a session.
    ///
    /// Without a session id a new session is created. The exchange is
    /// recorded only when the turn succeeds.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> AppResult<QueryResponse> {
        if query.trim().is_empty() {
            return Err(AppError::Other("Query must not be empty".to_string()));
        }

        // A fresh id is only registered once the turn succeeds
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => SessionManager::new_session_id(),
        };
        let history = self.sessions.get_history(&session_id)?;

        let start = Instant::now();
        let mut tools = ToolManager::new(self.registry.clone());
        let answer = self
            .generator
            .generate(query, history.as_deref(), &mut tools)
            .await?;
        let sources = tools.take_sources();

        self.sessions.add_exchange(&session_id, query, &answer)?;

        tracing::info!(
            "Answered query in session {} with {} source(s) in {:.2}s",
            session_id,
            sources.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(QueryResponse {
            answer,
            sources,
            session_id,
        })
    }

    /// Index one transcript, replacing any previous version of its course.
    ///
    /// A course whose stored fingerprint matches the document is left alone.
    pub async fn ingest_document(&self, document: &RawDocument) -> AppResult<DocumentStatus> {
        let processed = self.processor.process(document)?;
        self.store_processed(processed, &document.id).await
    }

    async fn store_processed(
        &self,
        processed: ProcessedDocument,
        origin: &str,
    ) -> AppResult<DocumentStatus> {
        let title = processed.course.title.clone();

        let stored = self.store.course_fingerprint(&title).await?;
        if stored.as_deref() == Some(processed.fingerprint.as_str()) {
            tracing::debug!("Course '{}' unchanged, skipping", title);
            return Ok(DocumentStatus::Unchanged {
                course_title: title,
            });
        }

        self.store
            .replace_course(
                &processed.course,
                &processed.chunks,
                Some(&processed.fingerprint),
            )
            .await?;

        tracing::info!(
            "Indexed course '{}' from {} ({} chunks)",
            title,
            origin,
            processed.chunks.len()
        );
        Ok(DocumentStatus::Indexed {
            course_title: title,
            chunks: processed.chunks.len(),
        })
    }

    /// Index every transcript file under `folder`.
    ///
    /// Unreadable or malformed files are logged and counted as failed;
    /// backend failures abort the run.
    pub async fn ingest_folder(&self, folder: &Path, clear_existing: bool) -> AppResult<IngestStats> {
        if !folder.is_dir() {
            return Err(AppError::Ingest(format!(
                "Folder not found: {}",
                folder.display()
            )));
        }

        let start = Instant::now();
        if clear_existing {
            tracing::info!("Clearing existing course data");
            self.store.clear_all().await?;
        }

        let mut stats = IngestStats::default();
        let mut seen_titles = HashSet::new();

        for entry in WalkDir::new(folder)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_transcript(path) {
                continue;
            }

            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping unreadable file {}: {}", path.display(), e);
                    stats.documents_failed += 1;
                    continue;
                }
            };

            let document = RawDocument::new(path.display().to_string(), text);
            let processed = match self.processor.process(&document) {
                Ok(processed) => processed,
                Err(AppError::Ingest(msg)) => {
                    tracing::warn!("Skipping {}: {}", path.display(), msg);
                    stats.documents_failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            // First file wins when several files share a course title
            if !seen_titles.insert(processed.course.title.clone()) {
                tracing::warn!(
                    "Skipping {}: course '{}' already ingested from another file",
                    path.display(),
                    processed.course.title
                );
                stats.courses_skipped += 1;
                continue;
            }

            match self.store_processed(processed, &document.id).await {
                Ok(DocumentStatus::Indexed { chunks, .. }) => {
                    stats.courses_added += 1;
                    stats.chunks_added += chunks;
                }
                Ok(DocumentStatus::Unchanged { .. }) => stats.courses_skipped += 1,
                Err(AppError::Ingest(msg)) => {
                    tracing::warn!("Skipping {}: {}", path.display(), msg);
                    stats.documents_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Ingested {}: {} added, {} unchanged, {} failed, {} chunks in {:.2}s",
            folder.display(),
            stats.courses_added,
            stats.courses_skipped,
            stats.documents_failed,
            stats.chunks_added,
            start.elapsed().as_secs_f64()
        );

        Ok(stats)
    }

    /// Indexed courses with their lesson counts, sorted by title.
    pub async fn catalog(&self) -> AppResult<CourseCatalog> {
        let courses: Vec<CourseSummary> = self
            .store
            .all_courses()
            .await?
            .into_iter()
            .map(|course| CourseSummary {
                lesson_count: course.lesson_count(),
                title: course.title,
                instructor: course.instructor,
            })
            .collect();

        Ok(CourseCatalog {
            total_courses: courses.len(),
            courses,
        })
    }
}

fn is_transcript(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            TRANSCRIPT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
