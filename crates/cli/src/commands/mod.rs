//! Command handlers for the docpilot CLI.

mod ask;
mod chat;
mod eval;
mod ingest;
mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use eval::EvalCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;

use docpilot_agent::{
    Generator, HttpRerankScorer, IndexRetriever, Pipeline, PipelineOptions, Reranker,
    TavilyClient, WebSearcher,
};
use docpilot_core::{AppConfig, AppResult};
use docpilot_knowledge::create_embedding_provider;
use docpilot_llm::create_client;
use std::sync::Arc;

/// Assemble the answer pipeline from the resolved configuration.
///
/// Shared by the ask, chat, and eval commands. Reranking and web search
/// are optional capabilities: the pipeline degrades or falls back when
/// they are not configured.
pub fn build_pipeline(config: &AppConfig) -> AppResult<Pipeline> {
    let embedder = create_embedding_provider(
        &config.embedding_provider,
        &config.embedding_model,
        &config.ollama_base_url,
        config.request_timeout_secs,
    )?;

    let retriever = Arc::new(IndexRetriever::new(embedder, config.index_path.clone()));

    let reranker = match config.rerank_endpoint.as_deref() {
        Some(endpoint) => {
            let scorer = HttpRerankScorer::new(endpoint, config.request_timeout_secs)?;
            Some(Reranker::new(Arc::new(scorer)))
        }
        None => {
            tracing::debug!("No rerank endpoint configured; reranking will degrade");
            None
        }
    };

    let llm = create_client(
        "ollama",
        Some(&config.ollama_base_url),
        config.request_timeout_secs,
    )?;
    let generator = Generator::new(
        llm,
        &config.llm_model,
        config.temperature,
        config.max_tokens,
        config.max_context_chars,
    );

    let searcher: Option<Arc<dyn WebSearcher>> = match config.tavily_api_key.as_deref() {
        Some(key) => Some(Arc::new(TavilyClient::new(
            key,
            config.request_timeout_secs,
        )?)),
        None => None,
    };

    Ok(Pipeline::new(
        retriever,
        reranker,
        generator,
        searcher,
        PipelineOptions {
            retrieval_k: config.retrieval_k,
            confidence_threshold: config.confidence_threshold,
            max_web_results: config.max_web_results,
        },
    ))
}
