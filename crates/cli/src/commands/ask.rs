//! Ask command handler.
//!
//! Answers a single question through the pipeline and prints the result.

use crate::commands::build_pipeline;
use clap::Args;
use docpilot_agent::Session;
use docpilot_core::{AppConfig, AppError, AppResult};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output the full turn as JSON (answer, sources, branch, confidence)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        if self.question.trim().is_empty() {
            return Err(AppError::Config("Question must not be empty".to_string()));
        }

        let pipeline = build_pipeline(config)?;
        let session = Session::new();

        let turn = pipeline.answer(&session, &self.question, config.mode).await?;

        if self.json {
            let output = serde_json::json!({
                "question": turn.query,
                "answer": turn.answer.text,
                "sources": turn.answer.sources,
                "branch": turn.branch.to_string(),
                "confidence": turn.confidence,
                "rerankDegraded": turn.rerank_degraded,
                "evidenceCount": turn.evidence.len(),
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", turn.answer.text);

            if !turn.answer.sources.is_empty() {
                println!("\nSources:");
                for source in &turn.answer.sources {
                    println!("  - {}", source);
                }
            }

            tracing::debug!(
                "Branch: {}, confidence: {:.3}, degraded: {}",
                turn.branch,
                turn.confidence,
                turn.rerank_degraded
            );
        }

        Ok(())
    }
}
