//! Interactive chat command handler.

use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tutor_core::{AppConfig, AppResult};

/// Chat about the course materials, keeping conversation context
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Transcript folder (default: knowledge.docsPath from config)
    #[arg(long)]
    pub docs: Option<PathBuf>,
}

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    NewSession,
    Skip,
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "/quit" | "/exit" => Input::Quit,
        "/new" => Input::NewSession,
        question => Input::Question(question),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let (system, stats) = super::load_system(config, self.docs.as_ref(), false).await?;
        println!(
            "{} course(s) indexed. Type /new for a new session, /quit to exit.",
            system.store().course_count().await?
        );
        tracing::debug!("Startup ingest: {:?}", stats);

        let mut session: Option<String> = None;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                Input::Quit => break,
                Input::Skip => continue,
                Input::NewSession => {
                    if let Some(id) = session.take() {
                        system.sessions().clear_session(&id)?;
                    }
                    println!("Started a new session.");
                }
                Input::Question(question) => {
                    match system.query(question, session.as_deref()).await {
                        Ok(response) => {
                            println!("{}\n", super::render_response(&response));
                            session = Some(response.session_id);
                        }
                        // A failed turn leaves the session as it was
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
            }
        }

        Ok(())
    }
}
