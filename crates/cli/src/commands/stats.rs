//! Stats command handler.

use clap::Args;
use docpilot_core::{AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let stats = docpilot_knowledge::stats(&config.index_path)?;

        if self.json {
            let output = serde_json::json!({
                "indexPath": config.index_path,
                "sources": stats.sources_count,
                "chunks": stats.chunks_count,
                "sizeBytes": stats.db_size_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&output)
                .map_err(|e| docpilot_core::AppError::Serialization(e.to_string()))?);
        } else {
            println!("Index: {:?}", config.index_path);
            println!("  Sources: {}", stats.sources_count);
            println!("  Chunks:  {}", stats.chunks_count);
            println!("  Size:    {} bytes", stats.db_size_bytes);
        }

        Ok(())
    }
}
