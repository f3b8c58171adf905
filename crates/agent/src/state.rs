//! Working state for the answer pipeline.
//!
//! Evidence flows strictly forward through the pipeline stages. Chunks are
//! created by retrieval, annotated once by reranking, and never mutated
//! after that. A finished query is recorded as a [`Turn`] appended to the
//! caller-owned [`Session`].

use serde::{Deserialize, Serialize};

pub use docpilot_core::config::Mode;

/// Confidence reported for an empty evidence set.
///
/// Rerank scores are unbounded logits, so "no evidence at all" is encoded
/// as a sentinel far below anything a scoring model emits. Any sane
/// threshold routes this to web augmentation when online.
pub const EMPTY_EVIDENCE_SCORE: f32 = -1.0e4;

/// One unit of evidence: a passage of text with its provenance and scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// Where the text came from: a corpus source name or a URL.
    pub source: String,
    /// Cosine similarity from retrieval. Web-derived chunks never touch
    /// the index and carry `websearch::WEB_RESULT_SIMILARITY` instead.
    pub similarity_score: f32,
    /// Pairwise relevance logit, set by the reranker. Unbounded; negative
    /// values mean low relevance, not an error.
    pub rerank_score: Option<f32>,
}

impl DocumentChunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, similarity_score: f32) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            similarity_score,
            rerank_score: None,
        }
    }
}

/// Ordered sequence of evidence chunks.
///
/// After reranking the chunks are sorted by descending rerank score, with
/// ties keeping their retrieval order. Before reranking they carry
/// retrieval order (descending similarity).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    chunks: Vec<DocumentChunk>,
}

impl EvidenceSet {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self { chunks }
    }

    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<DocumentChunk> {
        self.chunks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentChunk> {
        self.chunks.iter()
    }

    /// Sort by descending rerank score, stable on ties.
    ///
    /// Chunks without a rerank score sort last. NaN scores are treated as
    /// the lowest possible value.
    pub fn sort_by_rerank_score(&mut self) {
        self.chunks.sort_by(|a, b| {
            let sa = a.rerank_score.unwrap_or(f32::NEG_INFINITY);
            let sb = b.rerank_score.unwrap_or(f32::NEG_INFINITY);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Aggregate confidence: the maximum rerank score across the set, or
    /// the empty-set sentinel.
    pub fn confidence(&self) -> f32 {
        self.chunks
            .iter()
            .filter_map(|c| c.rerank_score)
            .fold(None, |acc: Option<f32>, s| {
                Some(acc.map_or(s, |m| m.max(s)))
            })
            .unwrap_or(EMPTY_EVIDENCE_SCORE)
    }

    /// Source identifiers in evidence order, deduplicated.
    pub fn sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.chunks
            .iter()
            .filter(|c| seen.insert(c.source.clone()))
            .map(|c| c.source.clone())
            .collect()
    }
}

/// Which branch the router selected for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Local,
    WebAugmented,
}

/// Branch actually recorded on the finished turn.
///
/// `WebAugmentedFallback` marks a turn that was routed to web augmentation
/// but fell back to local evidence because the search capability failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchTag {
    Local,
    WebAugmented,
    WebAugmentedFallback,
}

impl std::fmt::Display for BranchTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchTag::Local => write!(f, "local"),
            BranchTag::WebAugmented => write!(f, "web_augmented"),
            BranchTag::WebAugmentedFallback => write!(f, "web_augmented_fallback"),
        }
    }
}

/// The generator's output: answer text plus the sources it drew on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// One completed query: the question, the answer, and how we got there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub answer: Answer,
    pub evidence: EvidenceSet,
    pub confidence: f32,
    pub branch: BranchTag,
    /// Set when reranking was skipped and retrieval order was kept.
    pub rerank_degraded: bool,
}

/// Append-only conversation history, owned by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, rerank: Option<f32>) -> DocumentChunk {
        DocumentChunk {
            text: text.to_string(),
            source: "docs".to_string(),
            similarity_score: 0.5,
            rerank_score: rerank,
        }
    }

    #[test]
    fn test_confidence_is_max_rerank_score() {
        let set = EvidenceSet::new(vec![
            chunk("a", Some(-1.2)),
            chunk("b", Some(0.7)),
            chunk("c", Some(0.1)),
        ]);
        assert_eq!(set.confidence(), 0.7);
    }

    #[test]
    fn test_confidence_empty_set_is_sentinel() {
        assert_eq!(EvidenceSet::empty().confidence(), EMPTY_EVIDENCE_SCORE);
    }

    #[test]
    fn test_confidence_unscored_set_is_sentinel() {
        let set = EvidenceSet::new(vec![chunk("a", None), chunk("b", None)]);
        assert_eq!(set.confidence(), EMPTY_EVIDENCE_SCORE);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut set = EvidenceSet::new(vec![
            chunk("first-tied", Some(0.3)),
            chunk("high", Some(0.9)),
            chunk("second-tied", Some(0.3)),
            chunk("low", Some(-2.0)),
        ]);
        set.sort_by_rerank_score();

        let texts: Vec<&str> = set.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["high", "first-tied", "second-tied", "low"]);

        for pair in set.chunks().windows(2) {
            assert!(pair[0].rerank_score.unwrap() >= pair[1].rerank_score.unwrap());
        }
    }

    #[test]
    fn test_unscored_chunks_sort_last() {
        let mut set = EvidenceSet::new(vec![chunk("unscored", None), chunk("scored", Some(-5.0))]);
        set.sort_by_rerank_score();
        assert_eq!(set.chunks()[0].text, "scored");
    }

    #[test]
    fn test_sources_deduplicated_in_order() {
        let mut a = chunk("a", None);
        a.source = "alpha".to_string();
        let mut b = chunk("b", None);
        b.source = "beta".to_string();
        let mut c = chunk("c", None);
        c.source = "alpha".to_string();

        let set = EvidenceSet::new(vec![a, b, c]);
        assert_eq!(set.sources(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_session_append_only() {
        let mut session = Session::new();
        assert!(session.is_empty());
        session.push(Turn {
            query: "q".to_string(),
            answer: Answer {
                text: "a".to_string(),
                sources: vec![],
            },
            evidence: EvidenceSet::empty(),
            confidence: EMPTY_EVIDENCE_SCORE,
            branch: BranchTag::Local,
            rerank_degraded: false,
        });
        assert_eq!(session.len(), 1);
        assert_eq!(session.last().unwrap().query, "q");
    }
}
