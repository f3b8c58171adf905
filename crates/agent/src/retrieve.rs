//! Retrieval stage: embed the query and search the vector index.

use crate::state::{DocumentChunk, EvidenceSet};
use async_trait::async_trait;
use docpilot_core::{AppError, AppResult};
use docpilot_knowledge::EmbeddingProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Fetches candidate evidence for a query.
///
/// Injectable so tests can run the pipeline against canned evidence.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` chunks ordered by descending similarity, with
    /// rerank scores unset.
    ///
    /// A missing or empty index yields an empty set. An unreachable
    /// embedding service or a broken index is `RetrievalUnavailable` and
    /// fatal for the turn.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<EvidenceSet>;
}

/// Retriever backed by the persisted SQLite vector index.
pub struct IndexRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index_path: PathBuf,
}

impl IndexRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index_path: PathBuf) -> Self {
        Self {
            embedder,
            index_path,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<EvidenceSet> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| AppError::RetrievalUnavailable(format!("query embedding: {}", e)))?;

        let hits = docpilot_knowledge::search_index(&self.index_path, &query_embedding, k)
            .map_err(|e| AppError::RetrievalUnavailable(format!("index search: {}", e)))?;

        debug!("Retrieved {} candidates for query", hits.len());

        let chunks = hits
            .into_iter()
            .map(|hit| DocumentChunk::new(hit.text, hit.source, hit.score))
            .collect();

        Ok(EvidenceSet::new(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpilot_knowledge::embeddings::providers::mock::MockEmbedder;

    #[tokio::test]
    async fn test_missing_index_yields_empty_set() {
        let temp = tempfile::TempDir::new().unwrap();
        let retriever = IndexRetriever::new(
            Arc::new(MockEmbedder::new(64)),
            temp.path().join("missing.sqlite"),
        );
        let evidence = retriever.retrieve("anything", 5).await.unwrap();
        assert!(evidence.is_empty());
    }
}
