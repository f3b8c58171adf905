//! Reranking stage: pairwise relevance scoring over retrieved evidence.
//!
//! Scores are cross-encoder logits: unbounded reals where negative means
//! low relevance. If the scoring model is unavailable the stage degrades
//! rather than failing, keeping retrieval order and reporting a
//! conservative confidence that favors web augmentation.

use crate::state::{EvidenceSet, EMPTY_EVIDENCE_SCORE};
use async_trait::async_trait;
use docpilot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Scores a single (query, passage) pair.
#[async_trait]
pub trait RerankScorer: Send + Sync {
    async fn score(&self, query: &str, passage: &str) -> AppResult<f32>;
}

/// Outcome of the reranking stage.
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    pub evidence: EvidenceSet,
    pub confidence: f32,
    /// True when scoring was unavailable and retrieval order was kept.
    pub degraded: bool,
}

/// Reranker that applies a [`RerankScorer`] across an evidence set.
pub struct Reranker {
    scorer: std::sync::Arc<dyn RerankScorer>,
}

impl Reranker {
    pub fn new(scorer: std::sync::Arc<dyn RerankScorer>) -> Self {
        Self { scorer }
    }

    /// Score every chunk, re-sort by descending score, and report the
    /// maximum as the aggregate confidence.
    ///
    /// Never fails: if any scoring call errors, the whole stage degrades
    /// to retrieval order. The degraded confidence is the top similarity
    /// shifted down by one, which keeps cosine-ranged scores at or below
    /// zero so the default threshold still triggers augmentation.
    pub async fn rerank(&self, query: &str, evidence: EvidenceSet) -> RerankOutcome {
        if evidence.is_empty() {
            return RerankOutcome {
                evidence,
                confidence: EMPTY_EVIDENCE_SCORE,
                degraded: false,
            };
        }

        let mut scored = Vec::with_capacity(evidence.len());
        for chunk in evidence.iter() {
            match self.scorer.score(query, &chunk.text).await {
                Ok(score) => {
                    let mut chunk = chunk.clone();
                    chunk.rerank_score = Some(score);
                    scored.push(chunk);
                }
                Err(e) => {
                    warn!("Rerank scoring unavailable, keeping retrieval order: {}", e);
                    return Self::degrade(evidence);
                }
            }
        }

        let mut reranked = EvidenceSet::new(scored);
        reranked.sort_by_rerank_score();
        let confidence = reranked.confidence();

        debug!(
            "Reranked {} chunks, confidence {:.3}",
            reranked.len(),
            confidence
        );

        RerankOutcome {
            evidence: reranked,
            confidence,
            degraded: false,
        }
    }

    /// Outcome used when no scoring model is configured or reachable.
    pub(crate) fn degrade(evidence: EvidenceSet) -> RerankOutcome {
        let confidence = evidence
            .chunks()
            .first()
            .map(|c| c.similarity_score - 1.0)
            .unwrap_or(EMPTY_EVIDENCE_SCORE);

        RerankOutcome {
            evidence,
            confidence,
            degraded: true,
        }
    }
}

/// Request payload for the rerank scoring endpoint.
#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    query: &'a str,
    passage: &'a str,
}

/// Response from the rerank scoring endpoint.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f32,
}

/// Scorer backed by an HTTP cross-encoder service.
///
/// Expects `POST {endpoint}` with `{"query", "passage"}` returning
/// `{"score"}`. Any transport or protocol error surfaces as `Llm`, which
/// the reranker treats as a degrade signal.
pub struct HttpRerankScorer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRerankScorer {
    pub fn new(endpoint: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create rerank HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl RerankScorer for HttpRerankScorer {
    async fn score(&self, query: &str, passage: &str) -> AppResult<f32> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScoreRequest { query, passage })
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Rerank request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Llm(format!(
                "Rerank service error ({})",
                status
            )));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Malformed rerank response: {}", e)))?;

        Ok(body.score)
    }
}
