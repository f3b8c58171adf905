//! Generation stage: produce the final answer from query and evidence.

use crate::state::{Answer, EvidenceSet};
use docpilot_core::{AppError, AppResult};
use docpilot_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry delay after a failed generation attempt.
const RETRY_BACKOFF_MS: u64 = 250;

/// Builds the prompt and invokes the text-generation capability.
pub struct Generator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_context_chars: usize,
}

impl Generator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: &str,
        temperature: f32,
        max_tokens: u32,
        max_context_chars: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
            max_tokens,
            max_context_chars,
        }
    }

    /// Generate an answer from the evidence.
    ///
    /// Empty evidence still produces an answer: the model is told
    /// explicitly that no local context is available. A failed or empty
    /// completion is retried once before surfacing `GenerationFailed`.
    pub async fn generate(&self, query: &str, evidence: &EvidenceSet) -> AppResult<Answer> {
        let prompt = self.build_prompt(query, evidence);
        let text = self.complete_with_retry(&prompt).await?;

        Ok(Answer {
            text,
            sources: evidence.sources(),
        })
    }

    fn build_prompt(&self, query: &str, evidence: &EvidenceSet) -> String {
        if evidence.is_empty() {
            return format!(
                "No reference documentation is available for this question. \
                 Answer from general knowledge and say explicitly that no \
                 local context was found.\n\nQuestion: {}\n\nAnswer:",
                query
            );
        }

        let context = self.assemble_context(evidence);
        format!(
            "Based on the following context, answer the question.\n\n\
             Context:\n{}\n\nQuestion: {}\n\nAnswer:",
            context, query
        )
    }

    /// Concatenate evidence texts in order, stopping before the configured
    /// character budget is exceeded.
    ///
    /// Evidence order puts the lowest-priority chunks last, so truncating
    /// from the tail drops the lowest-scoring evidence first.
    fn assemble_context(&self, evidence: &EvidenceSet) -> String {
        let mut context = String::new();

        for chunk in evidence.iter() {
            let block_len = chunk.text.len() + chunk.source.len() + 16;
            if !context.is_empty() && context.len() + block_len > self.max_context_chars {
                debug!(
                    "Context budget reached, dropping remaining lower-priority chunks"
                );
                break;
            }
            if !context.is_empty() {
                context.push_str("\n\n");
            }
            context.push_str(&format!("[{}]\n{}", chunk.source, chunk.text));
        }

        context
    }

    async fn complete_with_retry(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match self.try_complete(&request).await {
            Ok(text) => Ok(text),
            Err(first) => {
                warn!("Generation failed, retrying once: {}", first);
                tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS)).await;
                self.try_complete(&request)
                    .await
                    .map_err(|e| AppError::GenerationFailed(e.to_string()))
            }
        }
    }

    async fn try_complete(&self, request: &LlmRequest) -> AppResult<String> {
        let response = self.client.complete(request).await?;
        let text = response.content.trim().to_string();
        if text.is_empty() {
            return Err(AppError::GenerationFailed(
                "model returned empty output".to_string(),
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DocumentChunk;
    use async_trait::async_trait;
    use docpilot_llm::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: format!("echo: {}", request.prompt),
                model: request.model.clone(),
                usage: LlmUsage::new(0, 0),
            })
        }
    }

    struct FlakyLlm {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl LlmClient for FlakyLlm {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(AppError::Llm("transient failure".to_string()));
            }
            Ok(LlmResponse {
                content: "recovered".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(0, 0),
            })
        }
    }

    fn generator(client: Arc<dyn LlmClient>, max_context_chars: usize) -> Generator {
        Generator::new(client, "test-model", 0.0, 256, max_context_chars)
    }

    fn chunk(text: &str, source: &str) -> DocumentChunk {
        DocumentChunk::new(text, source, 0.5)
    }

    #[tokio::test]
    async fn test_empty_evidence_gets_explicit_no_context_prompt() {
        let gen = generator(Arc::new(EchoLlm), 8000);
        let answer = gen
            .generate("How do I use checkpointers?", &EvidenceSet::empty())
            .await
            .unwrap();
        assert!(answer.text.contains("No reference documentation is available"));
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_includes_evidence_in_order() {
        let gen = generator(Arc::new(EchoLlm), 8000);
        let evidence = EvidenceSet::new(vec![
            chunk("first passage", "docs-a"),
            chunk("second passage", "docs-b"),
        ]);
        let answer = gen.generate("q", &evidence).await.unwrap();

        let first = answer.text.find("first passage").unwrap();
        let second = answer.text.find("second passage").unwrap();
        assert!(first < second);
        assert_eq!(answer.sources, vec!["docs-a", "docs-b"]);
    }

    #[tokio::test]
    async fn test_truncation_drops_tail_chunks() {
        let gen = generator(Arc::new(EchoLlm), 120);
        let evidence = EvidenceSet::new(vec![
            chunk(&"x".repeat(80), "keep"),
            chunk(&"y".repeat(80), "drop"),
        ]);
        let answer = gen.generate("q", &evidence).await.unwrap();
        assert!(answer.text.contains("keep"));
        assert!(!answer.text.contains(&"y".repeat(80)));
    }

    #[tokio::test]
    async fn test_one_retry_recovers_transient_failure() {
        let llm = Arc::new(FlakyLlm {
            calls: AtomicU32::new(0),
            fail_first: 1,
        });
        let gen = generator(llm.clone(), 8000);
        let answer = gen.generate("q", &EvidenceSet::empty()).await.unwrap();
        assert_eq!(answer.text, "recovered");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_failure_surfaces_after_retry() {
        let llm = Arc::new(FlakyLlm {
            calls: AtomicU32::new(0),
            fail_first: 10,
        });
        let gen = generator(llm.clone(), 8000);
        let err = gen.generate("q", &EvidenceSet::empty()).await.unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed(_)));
        // Exactly one retry.
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }
}
