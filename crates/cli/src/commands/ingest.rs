//! Ingest command handler.

use clap::Args;
use std::path::PathBuf;
use tutor_core::{AppConfig, AppResult};

/// Index a folder of course transcripts
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Transcript folder (default: knowledge.docsPath from config)
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Remove all indexed courses first
    #[arg(long)]
    pub clear: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let (system, stats) = super::load_system(config, self.docs.as_ref(), self.clear).await?;

        if self.json {
            let output = serde_json::json!({
                "coursesAdded": stats.courses_added,
                "coursesSkipped": stats.courses_skipped,
                "documentsFailed": stats.documents_failed,
                "chunksAdded": stats.chunks_added,
                "totalCourses": system.store().course_count().await?,
                "totalChunks": system.store().chunk_count().await?,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} course(s) ({} chunks); {} unchanged, {} failed",
                stats.courses_added,
                stats.chunks_added,
                stats.courses_skipped,
                stats.documents_failed
            );
        }

        Ok(())
    }
}
