//! Web augmentation: live search results merged ahead of local evidence.

use crate::state::{DocumentChunk, EvidenceSet};
use async_trait::async_trait;
use docpilot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One result from the web-search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Injectable web-search capability.
///
/// Rate limits and network errors surface as `WebSearchFailed`, which the
/// pipeline treats as recoverable.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<WebSearchResult>>;
}

/// Similarity placeholder for web-derived chunks.
///
/// Web results never went through the vector index, so they carry this
/// sentinel rather than a measured cosine similarity.
pub const WEB_RESULT_SIMILARITY: f32 = 0.0;

/// Merge web results ahead of the local evidence.
///
/// Web chunks carry no scores of their own: similarity holds the
/// [`WEB_RESULT_SIMILARITY`] sentinel and the rerank score stays unset.
/// They take the front of the set because the branch was taken precisely
/// when local confidence was low. Result order from the search API is
/// preserved.
pub fn merge_web_results(results: &[WebSearchResult], local: EvidenceSet) -> EvidenceSet {
    let mut chunks: Vec<DocumentChunk> = results
        .iter()
        .map(|r| {
            let text = if r.snippet.is_empty() {
                r.title.clone()
            } else {
                format!("{}\n{}", r.title, r.snippet)
            };
            DocumentChunk::new(text, r.url.clone(), WEB_RESULT_SIMILARITY)
        })
        .collect();

    chunks.extend(local.into_chunks());
    EvidenceSet::new(chunks)
}

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// Web searcher backed by the Tavily search API.
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                AppError::WebSearchFailed(format!("Failed to create search client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WebSearcher for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<WebSearchResult>> {
        debug!("Issuing web search for query");

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&TavilyRequest {
                api_key: &self.api_key,
                query,
                max_results,
            })
            .send()
            .await
            .map_err(|e| AppError::WebSearchFailed(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::WebSearchFailed(format!(
                "Search API error ({})",
                status
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::WebSearchFailed(format!("Malformed search response: {}", e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| WebSearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str) -> WebSearchResult {
        WebSearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: format!("snippet for {}", title),
        }
    }

    #[test]
    fn test_merge_places_web_first_in_api_order() {
        let local = EvidenceSet::new(vec![
            DocumentChunk::new("local one", "docs", 0.9),
            DocumentChunk::new("local two", "docs", 0.8),
        ]);
        let web = vec![result("W1", "https://a"), result("W2", "https://b")];

        let merged = merge_web_results(&web, local);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged.chunks()[0].source, "https://a");
        assert_eq!(merged.chunks()[1].source, "https://b");
        assert_eq!(merged.chunks()[2].text, "local one");
        assert!(merged.chunks()[0].rerank_score.is_none());
        assert_eq!(merged.chunks()[0].similarity_score, WEB_RESULT_SIMILARITY);
        // Local chunks keep their measured similarity.
        assert_eq!(merged.chunks()[2].similarity_score, 0.9);
    }

    #[test]
    fn test_merge_with_empty_local() {
        let merged = merge_web_results(&[result("W", "https://w")], EvidenceSet::empty());
        assert_eq!(merged.len(), 1);
        assert!(merged.chunks()[0].text.starts_with("W\n"));
    }

    #[test]
    fn test_merge_without_results_is_identity() {
        let local = EvidenceSet::new(vec![DocumentChunk::new("only", "docs", 0.4)]);
        let merged = merge_web_results(&[], local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.chunks()[0].text, "only");
    }
}
