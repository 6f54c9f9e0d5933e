//! Ask command handler.
//!
//! Answers one question in a fresh session.

use clap::Args;
use std::path::PathBuf;
use tutor_core::{AppConfig, AppResult};

/// Ask one question about the course materials
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Transcript folder (default: knowledge.docsPath from config)
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Question: {}", self.question);

        let (system, _) = super::load_system(config, self.docs.as_ref(), false).await?;
        let response = system.query(&self.question, None).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!("{}", super::render_response(&response));
        }

        Ok(())
    }
}
