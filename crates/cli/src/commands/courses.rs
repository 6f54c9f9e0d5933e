//! Courses command handler.

use clap::Args;
use std::path::PathBuf;
use tutor_core::{AppConfig, AppResult};

/// List indexed courses with their lesson counts
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Transcript folder (default: knowledge.docsPath from config)
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing courses command");

        let (system, _) = super::load_system(config, self.docs.as_ref(), false).await?;
        let catalog = system.catalog().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            return Ok(());
        }

        println!("{} course(s)", catalog.total_courses);
        for course in &catalog.courses {
            match &course.instructor {
                Some(instructor) => println!(
                    "  {} ({} lessons, {})",
                    course.title, course.lesson_count, instructor
                ),
                None => println!("  {} ({} lessons)", course.title, course.lesson_count),
            }
        }

        Ok(())
    }
}
