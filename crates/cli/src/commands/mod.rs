//! Command handlers for the tutor CLI.
//!
//! The course index lives in memory, so every command indexes the
//! transcript folder before doing its work.

pub mod ask;
pub mod chat;
pub mod courses;
pub mod ingest;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use courses::CoursesCommand;
pub use ingest::IngestCommand;

use std::path::PathBuf;
use tutor_core::{AppConfig, AppResult};
use tutor_knowledge::{IngestStats, QueryResponse, RagSystem};

/// Build the assistant and index the transcript folder.
///
/// `docs` overrides the configured folder.
pub(crate) async fn load_system(
    config: &AppConfig,
    docs: Option<&PathBuf>,
    clear_existing: bool,
) -> AppResult<(RagSystem, IngestStats)> {
    let folder = docs.cloned().unwrap_or_else(|| config.docs_dir());
    let system = RagSystem::new(config).await?;

    tracing::info!("Indexing transcripts from {}", folder.display());
    let stats = system.ingest_folder(&folder, clear_existing).await?;
    Ok((system, stats))
}

/// Plain-text rendering of an answer and its sources.
pub(crate) fn render_response(response: &QueryResponse) -> String {
    let mut out = response.answer.trim_end().to_string();
    if !response.sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in &response.sources {
            match &source.link {
                Some(link) => out.push_str(&format!("\n  - {} ({})", source.text, link)),
                None => out.push_str(&format!("\n  - {}", source.text)),
            }
        }
    }
    out
}
