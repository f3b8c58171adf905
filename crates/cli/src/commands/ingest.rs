//! Ingest command handler.
//!
//! Builds or rebuilds the vector index from documentation dumps.

use clap::Args;
use docpilot_core::{AppConfig, AppResult};
use docpilot_knowledge::{create_embedding_provider, IngestOptions};
use std::path::PathBuf;

/// Build the vector index from documentation dumps
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Directory holding *_llms*.txt dumps (default: configured data dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Drop all existing sources and chunks before ingesting
    #[arg(long)]
    pub reset: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let embedder = create_embedding_provider(
            &config.embedding_provider,
            &config.embedding_model,
            &config.ollama_base_url,
            config.request_timeout_secs,
        )?;

        if let Some(parent) = config.index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = IngestOptions {
            data_dir: self.data_dir.clone().unwrap_or_else(|| config.data_dir.clone()),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            reset: self.reset,
        };

        let stats =
            docpilot_knowledge::ingest(&config.index_path, embedder.as_ref(), &options).await?;

        println!(
            "Indexed {} sources ({} chunks, {} bytes) in {:.1}s",
            stats.sources_count, stats.chunks_count, stats.bytes_processed, stats.duration_secs
        );

        if stats.sources_count == 0 {
            println!(
                "No *_llms*.txt files found in {:?}",
                self.data_dir.as_ref().unwrap_or(&config.data_dir)
            );
        }

        Ok(())
    }
}
