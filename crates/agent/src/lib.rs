//! The docpilot answer pipeline.
//!
//! Retrieval-augmented question answering over a local documentation
//! index, with a confidence-gated fallback to live web search. The
//! pipeline is a linear chain of stages; external capabilities
//! (embedding, reranking, generation, web search) are injected as traits
//! so they can be swapped or stubbed.

pub mod eval;
pub mod generate;
pub mod pipeline;
pub mod rerank;
pub mod retrieve;
pub mod route;
pub mod state;
pub mod websearch;

pub use generate::Generator;
pub use pipeline::{Pipeline, PipelineOptions};
pub use rerank::{HttpRerankScorer, RerankScorer, Reranker};
pub use retrieve::{IndexRetriever, Retriever};
pub use route::route;
pub use state::{
    Answer, Branch, BranchTag, DocumentChunk, EvidenceSet, Mode, Session, Turn,
    EMPTY_EVIDENCE_SCORE,
};
pub use websearch::{
    merge_web_results, TavilyClient, WebSearchResult, WebSearcher, WEB_RESULT_SIMILARITY,
};
