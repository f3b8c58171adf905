//! Offline evaluation harness.
//!
//! Runs a dataset of questions through the pipeline and scores the
//! answers with the metrics in [`metrics`], producing a JSON report with
//! per-category and per-difficulty breakdowns.

pub mod metrics;

use crate::pipeline::Pipeline;
use crate::state::{Mode, Session};
use chrono::{DateTime, Utc};
use docpilot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// One question in the evaluation dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalQuestion {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    /// Keywords a good answer should mention.
    #[serde(default)]
    pub expected_topics: Vec<String>,
    /// Exact substrings (API names, call syntax) the answer should contain.
    #[serde(default)]
    pub expected_snippets: Vec<String>,
    /// Whether the answer should include a code example.
    #[serde(default)]
    pub expects_code: bool,
}

/// The dataset file: a list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalDataset {
    pub questions: Vec<EvalQuestion>,
}

impl EvalDataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read dataset {:?}: {}", path, e)))?;
        let dataset: EvalDataset = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("Invalid dataset {:?}: {}", path, e)))?;
        if dataset.questions.is_empty() {
            return Err(AppError::Config(format!("Dataset {:?} has no questions", path)));
        }
        Ok(dataset)
    }
}

/// Scored outcome for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub id: String,
    pub question: String,
    pub category: String,
    pub difficulty: String,
    pub answer: String,
    pub branch: String,
    pub confidence: f32,
    pub rerank_degraded: bool,
    pub topic_coverage: f32,
    pub snippet_presence: f32,
    pub has_code: bool,
    pub latency_ms: u64,
    pub score: f32,
    /// Set when the pipeline failed on this question; score is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mean score over a group of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub average_score: f32,
}

/// Full evaluation report, serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub mode: String,
    pub total_questions: usize,
    pub failed_questions: usize,
    pub average_score: f32,
    pub by_category: BTreeMap<String, GroupStats>,
    pub by_difficulty: BTreeMap<String, GroupStats>,
    pub results: Vec<QuestionResult>,
}

impl EvalReport {
    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Wrote evaluation report to {:?}", path);
        Ok(())
    }
}

/// Run every dataset question through the pipeline and score the answers.
///
/// A failing question is recorded with score 0 rather than aborting the
/// whole run; each question gets a fresh empty session so turns stay
/// independent.
pub async fn run_eval(pipeline: &Pipeline, dataset: &EvalDataset, mode: Mode) -> EvalReport {
    let mut results = Vec::with_capacity(dataset.questions.len());

    for question in &dataset.questions {
        info!("Evaluating question {}", question.id);
        let session = Session::new();
        let started = std::time::Instant::now();

        let outcome = pipeline.answer(&session, &question.question, mode).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(turn) => {
                let coverage =
                    metrics::topic_coverage(&turn.answer.text, &question.expected_topics);
                let snippets =
                    metrics::snippet_presence(&turn.answer.text, &question.expected_snippets);
                let has_code = metrics::has_code_block(&turn.answer.text);
                let score = metrics::question_score(
                    &turn.answer.text,
                    &question.expected_topics,
                    &question.expected_snippets,
                    question.expects_code,
                );
                QuestionResult {
                    id: question.id.clone(),
                    question: question.question.clone(),
                    category: question.category.clone(),
                    difficulty: question.difficulty.clone(),
                    answer: turn.answer.text,
                    branch: turn.branch.to_string(),
                    confidence: turn.confidence,
                    rerank_degraded: turn.rerank_degraded,
                    topic_coverage: coverage,
                    snippet_presence: snippets,
                    has_code,
                    latency_ms,
                    score,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Question {} failed: {}", question.id, e);
                QuestionResult {
                    id: question.id.clone(),
                    question: question.question.clone(),
                    category: question.category.clone(),
                    difficulty: question.difficulty.clone(),
                    answer: String::new(),
                    branch: "none".to_string(),
                    confidence: 0.0,
                    rerank_degraded: false,
                    topic_coverage: 0.0,
                    snippet_presence: 0.0,
                    has_code: false,
                    latency_ms,
                    score: 0.0,
                    error: Some(e.to_string()),
                }
            }
        };

        results.push(result);
    }

    build_report(results, mode)
}

fn build_report(results: Vec<QuestionResult>, mode: Mode) -> EvalReport {
    let total = results.len();
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    let average_score = if total > 0 {
        results.iter().map(|r| r.score).sum::<f32>() / total as f32
    } else {
        0.0
    };

    EvalReport {
        generated_at: Utc::now(),
        mode: mode.as_str().to_string(),
        total_questions: total,
        failed_questions: failed,
        average_score,
        by_category: group_stats(&results, |r| &r.category),
        by_difficulty: group_stats(&results, |r| &r.difficulty),
        results,
    }
}

fn group_stats<'a, F>(results: &'a [QuestionResult], key: F) -> BTreeMap<String, GroupStats>
where
    F: Fn(&'a QuestionResult) -> &'a str,
{
    let mut groups: BTreeMap<String, Vec<f32>> = BTreeMap::new();
    for result in results {
        let name = key(result);
        if name.is_empty() {
            continue;
        }
        groups.entry(name.to_string()).or_default().push(result.score);
    }

    groups
        .into_iter()
        .map(|(name, scores)| {
            let count = scores.len();
            let average_score = scores.iter().sum::<f32>() / count as f32;
            (name, GroupStats { count, average_score })
        })
        .collect()
}
