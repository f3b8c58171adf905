//! The answer pipeline: retrieve, rerank, route, generate.
//!
//! A linear state machine per query. Each stage's output is the sole
//! input to the next, and the only branch point is after routing. The
//! caller owns the session; the pipeline returns a finished [`Turn`] for
//! the caller to append.

use crate::generate::Generator;
use crate::rerank::{Reranker, RerankOutcome};
use crate::retrieve::Retriever;
use crate::route::route;
use crate::state::{Branch, BranchTag, EvidenceSet, Mode, Session, Turn};
use crate::websearch::{merge_web_results, WebSearcher};
use docpilot_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Knobs for one pipeline instance. Fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidates fetched per query.
    pub retrieval_k: usize,
    /// Confidence below this triggers web augmentation when online.
    pub confidence_threshold: f32,
    /// Web results requested per augmentation.
    pub max_web_results: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retrieval_k: 5,
            confidence_threshold: 0.0,
            max_web_results: 3,
        }
    }
}

/// The assembled pipeline. Stateless between turns.
pub struct Pipeline {
    retriever: Arc<dyn Retriever>,
    reranker: Option<Reranker>,
    generator: Generator,
    searcher: Option<Arc<dyn WebSearcher>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        reranker: Option<Reranker>,
        generator: Generator,
        searcher: Option<Arc<dyn WebSearcher>>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            retriever,
            reranker,
            generator,
            searcher,
            options,
        }
    }

    /// Answer one query and produce the resulting turn.
    ///
    /// The session is read-only here; appending the turn is the caller's
    /// job. Fatal failures (`RetrievalUnavailable`, `GenerationFailed`)
    /// propagate; a failed web search falls back to local evidence.
    pub async fn answer(&self, session: &Session, query: &str, mode: Mode) -> AppResult<Turn> {
        debug!(
            "Answering query (mode={}, history={} turns)",
            mode,
            session.len()
        );

        let retrieved = self.retriever.retrieve(query, self.options.retrieval_k).await?;
        debug!("Retrieved {} chunks", retrieved.len());

        let RerankOutcome {
            evidence,
            confidence,
            degraded,
        } = match &self.reranker {
            Some(reranker) => reranker.rerank(query, retrieved).await,
            None => Reranker::degrade(retrieved),
        };

        let branch = route(confidence, mode, self.options.confidence_threshold);
        info!(
            "Routed to {:?} (confidence={:.3}, threshold={:.3}, degraded={})",
            branch, confidence, self.options.confidence_threshold, degraded
        );

        let (answer, final_evidence, tag) = match branch {
            Branch::Local => {
                let answer = self.generator.generate(query, &evidence).await?;
                (answer, evidence, BranchTag::Local)
            }
            Branch::WebAugmented => self.answer_web_augmented(query, evidence).await?,
        };

        Ok(Turn {
            query: query.to_string(),
            answer,
            evidence: final_evidence,
            confidence,
            branch: tag,
            rerank_degraded: degraded,
        })
    }

    /// Web-augmented branch with fallback to local evidence.
    async fn answer_web_augmented(
        &self,
        query: &str,
        local: EvidenceSet,
    ) -> AppResult<(crate::state::Answer, EvidenceSet, BranchTag)> {
        let search_result = match &self.searcher {
            Some(searcher) => searcher.search(query, self.options.max_web_results).await,
            None => Err(AppError::WebSearchFailed(
                "no web search capability configured".to_string(),
            )),
        };

        match search_result {
            Ok(results) => {
                debug!("Merging {} web results ahead of local evidence", results.len());
                let merged = merge_web_results(&results, local);
                let answer = self.generator.generate(query, &merged).await?;
                Ok((answer, merged, BranchTag::WebAugmented))
            }
            Err(AppError::WebSearchFailed(reason)) => {
                warn!("Web search failed, answering from local evidence: {}", reason);
                let answer = self.generator.generate(query, &local).await?;
                Ok((answer, local, BranchTag::WebAugmentedFallback))
            }
            Err(other) => Err(other),
        }
    }
}
