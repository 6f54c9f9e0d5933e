//! Tutor CLI
//!
//! Main entry point for the tutor command-line tool.
//! Answers questions about a folder of course transcripts.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, CoursesCommand, IngestCommand};
use std::path::PathBuf;
use tutor_core::{config::AppConfig, logging, AppResult};

/// Tutor - question answering over course transcripts
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Question answering over course transcripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TUTOR_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (anthropic, ollama)
    #[arg(short, long, global = true, env = "TUTOR_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "TUTOR_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a folder of course transcripts
    Ingest(IngestCommand),

    /// List indexed courses
    Courses(CoursesCommand),

    /// Ask one question about the course materials
    Ask(AskCommand),

    /// Interactive chat with conversation history
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, YAML file and environment
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Tutor CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Courses(_) => "courses",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Courses(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
