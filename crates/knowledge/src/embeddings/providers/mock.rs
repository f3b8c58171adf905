//! Deterministic mock embedding provider.
//!
//! Hashes word and character-trigram features into a fixed-dimension
//! vector. Not semantically meaningful, but deterministic: identical text
//! always produces an identical embedding, which is what the pipeline's
//! determinism property and the test suites need.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docpilot_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Mock embedding provider based on trigram hashing.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.dimensions;
        let mut embedding = vec![0.0f32; dim];

        let lower = text.to_lowercase();

        let stop_words: HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for",
            "to", "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be",
            "have", "has", "had", "it", "its", "their", "they", "them",
        ]
        .iter()
        .copied()
        .collect();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in &words {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                embedding[(trigram_hash as usize) % dim] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % dim] += *freq as f32;
        }

        // Normalize to unit vector.
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = MockEmbedder::new(384);
        let a = embedder.embed("How do I use checkpointers?").await.unwrap();
        let b = embedder.embed("How do I use checkpointers?").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_text_differs() {
        let embedder = MockEmbedder::new(384);
        let a = embedder.embed("checkpointers and persistence").await.unwrap();
        let b = embedder.embed("streaming token output").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let embedder = MockEmbedder::new(384);
        let v = embedder.embed("some reasonable sentence here").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = MockEmbedder::new(128);
        let batch = embedder
            .embed_batch(&["alpha beta".to_string(), "gamma delta".to_string()])
            .await
            .unwrap();
        let single = embedder.embed("alpha beta").await.unwrap();
        assert_eq!(batch[0], single);
        assert_eq!(batch.len(), 2);
    }
}
