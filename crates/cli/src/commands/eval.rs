//! Eval command handler.
//!
//! Runs the offline evaluation dataset through the pipeline and writes a
//! JSON report.

use crate::commands::build_pipeline;
use clap::Args;
use docpilot_agent::eval::{run_eval, EvalDataset};
use docpilot_core::{AppConfig, AppResult};
use std::path::PathBuf;

/// Run the offline evaluation harness
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Path to the evaluation dataset (JSON)
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Where to write the report
    #[arg(short, long, default_value = "eval_report.json")]
    pub output: PathBuf,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command");

        let dataset = EvalDataset::load(&self.dataset)?;
        let pipeline = build_pipeline(config)?;

        println!(
            "Evaluating {} questions ({} mode)...",
            dataset.questions.len(),
            config.mode
        );

        let report = run_eval(&pipeline, &dataset, config.mode).await;
        report.save(&self.output)?;

        println!(
            "\nAverage score: {:.3} ({} questions, {} failed)",
            report.average_score, report.total_questions, report.failed_questions
        );

        if !report.by_category.is_empty() {
            println!("\nBy category:");
            for (category, stats) in &report.by_category {
                println!(
                    "  {:<20} {:.3} ({} questions)",
                    category, stats.average_score, stats.count
                );
            }
        }

        if !report.by_difficulty.is_empty() {
            println!("\nBy difficulty:");
            for (difficulty, stats) in &report.by_difficulty {
                println!(
                    "  {:<20} {:.3} ({} questions)",
                    difficulty, stats.average_score, stats.count
                );
            }
        }

        println!("\nReport written to {:?}", self.output);
        Ok(())
    }
}
