//! docpilot CLI
//!
//! Main entry point for the docpilot command-line tool.
//! Answers documentation questions with local-first RAG and an optional
//! web-search fallback.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, EvalCommand, IngestCommand, StatsCommand};
use docpilot_core::{config::Mode, logging, AppConfig, AppResult};
use std::path::PathBuf;

/// docpilot - documentation Q&A with local RAG and web fallback
#[derive(Parser, Debug)]
#[command(name = "docpilot")]
#[command(about = "Documentation Q&A with local RAG and web fallback", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: docpilot.yaml)
    #[arg(short, long, global = true, env = "DOCPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Operating mode (offline, online)
    #[arg(long, global = true, env = "AGENT_MODE")]
    mode: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "LLM_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive multi-turn chat
    Chat(ChatCommand),

    /// Build the vector index from documentation dumps
    Ingest(IngestCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Run the offline evaluation harness
    Eval(EvalCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mode = cli.mode.as_deref().map(Mode::parse).transpose()?;

    let config = AppConfig::load(cli.config)?.with_overrides(
        mode,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    config.validate()?;

    tracing::info!("docpilot starting");
    tracing::debug!("Mode: {}", config.mode);
    tracing::debug!("Model: {}", config.llm_model);
    tracing::debug!("Index: {:?}", config.index_path);

    // Query commands can run without an index (they just get no local
    // evidence), but that is usually a mistake worth flagging up front.
    if !config.index_path.exists() {
        match &cli.command {
            Commands::Ask(_) | Commands::Chat(_) | Commands::Eval(_) => {
                tracing::warn!(
                    "No index at {:?}; run 'docpilot ingest' to build one",
                    config.index_path
                );
            }
            _ => {}
        }
    }

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Ingest(_) => "ingest",
        Commands::Stats(_) => "stats",
        Commands::Eval(_) => "eval",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
