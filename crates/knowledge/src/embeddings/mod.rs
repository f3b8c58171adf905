//! Embedding providers.
//!
//! The embedding capability is an injectable trait so the pipeline and
//! its tests can run on a deterministic provider with no network.

pub mod providers;

use docpilot_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from a provider name.
pub fn create_embedding_provider(
    provider: &str,
    model: &str,
    base_url: &str,
    timeout_secs: u64,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "ollama" => Ok(Arc::new(providers::ollama::OllamaEmbedder::new(
            model,
            base_url,
            timeout_secs,
        )?)),

        "mock" => Ok(Arc::new(providers::mock::MockEmbedder::new(384))),

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, mock",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider =
            create_embedding_provider("mock", "trigram", "http://localhost:11434", 30).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_unknown_provider() {
        let result =
            create_embedding_provider("unknown", "m", "http://localhost:11434", 30);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider =
            create_embedding_provider("mock", "trigram", "http://localhost:11434", 30).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
