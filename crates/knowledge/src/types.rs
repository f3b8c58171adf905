//! Corpus type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document recorded in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSource {
    /// Unique source identifier
    pub id: String,

    /// Human-readable source name (e.g., "langgraph" for langgraph_llms.txt)
    pub name: String,

    /// Path the source was ingested from
    pub path: PathBuf,

    /// When this source was indexed
    pub indexed_at: DateTime<Utc>,

    /// Source size in bytes
    pub size_bytes: u64,
}

/// A text chunk with its embedding, as persisted in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source document ID
    pub source_id: String,

    /// Position within the source
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Metadata (source name, section heading, char offsets)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A retrieval hit: chunk text, its source identifier, and similarity score.
///
/// This is the narrow contract the pipeline consumes; the on-disk layout
/// stays private to this crate.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Chunk text content
    pub text: String,

    /// Source identifier (file name / section)
    pub source: String,

    /// Cosine similarity against the query embedding
    pub score: f32,
}

/// Options for the ingest operation.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Directory holding `*_llms*.txt` documentation dumps
    pub data_dir: PathBuf,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    pub chunk_overlap: usize,

    /// Clear the index before ingesting
    pub reset: bool,
}

/// Statistics from an ingest operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of sources processed
    pub sources_count: u32,

    /// Number of chunks created
    pub chunks_count: u32,

    /// Total bytes processed
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for the persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of sources
    pub sources_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Database size in bytes
    pub db_size_bytes: u64,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
    pub metadata: serde_json::Value,
}
