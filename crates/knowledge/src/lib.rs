//! Corpus management for docpilot.
//!
//! Ingests llms.txt documentation dumps into a SQLite-backed vector index
//! and exposes the narrow similarity-search contract the pipeline consumes.
//! The index is rebuilt out-of-band by `ingest`; query serving never
//! writes to it.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod types;

pub use embeddings::{create_embedding_provider, EmbeddingProvider};
pub use types::{
    ChunkCandidate, CorpusChunk, CorpusSource, CorpusStats, IngestOptions, IngestStats, SearchHit,
};

use chrono::Utc;
use docpilot_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Ingest documentation dumps and populate the vector index.
///
/// Walks `data_dir` for files matching the `*_llms*.txt` convention,
/// splits them into sections, chunks, embeds, and persists everything.
pub async fn ingest(
    index_path: &Path,
    embedder: &dyn EmbeddingProvider,
    options: &IngestOptions,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!("Starting ingest from {:?}", options.data_dir);

    if !options.data_dir.exists() {
        return Err(AppError::Knowledge(format!(
            "Data directory does not exist: {:?}",
            options.data_dir
        )));
    }

    let conn = index::open_index(index_path)?;

    if options.reset {
        tracing::info!("Resetting corpus index");
        index::reset_index(&conn)?;
    }

    let mut sources_count = 0u32;
    let mut chunks_count = 0u32;
    let mut bytes_processed = 0u64;

    let mut files: Vec<_> = WalkDir::new(&options.data_dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_docs_dump(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    for path in files {
        let (chunks, bytes) = ingest_file(&conn, embedder, &path, options).await?;
        sources_count += 1;
        chunks_count += chunks;
        bytes_processed += bytes;
    }

    let duration = start.elapsed();

    tracing::info!(
        "Ingest completed: {} sources, {} chunks, {} bytes in {:.2}s",
        sources_count,
        chunks_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        sources_count,
        chunks_count,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Check whether a file looks like an llms.txt documentation dump.
fn is_docs_dump(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".txt") && name.contains("_llms")
}

/// Ingest a single documentation dump.
async fn ingest_file(
    conn: &rusqlite::Connection,
    embedder: &dyn EmbeddingProvider,
    path: &Path,
    options: &IngestOptions,
) -> AppResult<(u32, u64)> {
    tracing::debug!("Ingesting file: {:?}", path);

    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;
    let size_bytes = text.len() as u64;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let source_name = parser::source_name_from_stem(stem);

    let source_id = uuid::Uuid::new_v4().to_string();
    let source = CorpusSource {
        id: source_id.clone(),
        name: source_name.clone(),
        path: path.to_path_buf(),
        indexed_at: Utc::now(),
        size_bytes,
    };

    index::insert_source(conn, &source)?;

    let mut chunks_count = 0u32;

    for section in parser::parse_llms_txt(&text) {
        let metadata = serde_json::json!({
            "source": source_name,
            "section": section.heading,
        });

        let candidates = chunker::chunk_text(
            &section.content,
            options.chunk_size,
            options.chunk_overlap,
            &metadata,
        );

        for candidate in candidates {
            let embedding = embedder.embed(&candidate.text).await?;

            let chunk = CorpusChunk {
                id: uuid::Uuid::new_v4().to_string(),
                source_id: source_id.clone(),
                position: chunks_count,
                text: candidate.text,
                embedding: Some(embedding),
                metadata: candidate.metadata,
            };

            index::insert_chunk(conn, &chunk)?;
            chunks_count += 1;
        }
    }

    tracing::debug!(
        "Ingested {:?}: {} chunks, {} bytes",
        path,
        chunks_count,
        size_bytes
    );

    Ok((chunks_count, size_bytes))
}

/// Search the persisted index for the top-k chunks nearest to the query
/// embedding.
///
/// A missing index file or an empty index yields an empty result set, not
/// an error; a broken index surfaces as `Knowledge`.
pub fn search_index(
    index_path: &Path,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<SearchHit>> {
    if !index_path.exists() {
        tracing::warn!("Index not found at {:?}; returning no hits", index_path);
        return Ok(vec![]);
    }

    let conn = index::open_index(index_path)?;
    index::search(&conn, query_embedding, top_k)
}

/// Get statistics for the persisted index.
pub fn stats(index_path: &Path) -> AppResult<CorpusStats> {
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "No index found at {:?}. Run 'docpilot ingest' first.",
            index_path
        )));
    }

    let conn = index::open_index(index_path)?;
    let (sources_count, chunks_count) = index::get_stats(&conn)?;
    let db_size_bytes = std::fs::metadata(index_path).map(|m| m.len()).unwrap_or(0);

    Ok(CorpusStats {
        sources_count,
        chunks_count,
        db_size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockEmbedder;
    use std::path::PathBuf;

    fn write_dump(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_ingest_and_search() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        let index_path = temp.path().join("index.sqlite");

        write_dump(
            &data_dir,
            "langgraph_llms.txt",
            "# Checkpointers\nCheckpointers persist graph state between runs. \
             Use a checkpointer to add persistence and resume conversations.\n\
             # Streaming\nStreaming emits tokens as they are generated.\n",
        );

        let embedder = MockEmbedder::new(128);
        let options = IngestOptions {
            data_dir: data_dir.clone(),
            chunk_size: 200,
            chunk_overlap: 40,
            reset: false,
        };

        let stats = ingest(&index_path, &embedder, &options).await.unwrap();
        assert_eq!(stats.sources_count, 1);
        assert!(stats.chunks_count >= 2);

        let query = embedder.embed("how do checkpointers work").await.unwrap();
        let hits = search_index(&index_path, &query, 3).unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].text.to_lowercase().contains("checkpointer"));
        assert!(hits[0].source.starts_with("langgraph"));
    }

    #[tokio::test]
    async fn test_ingest_skips_non_dumps() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        let index_path = temp.path().join("index.sqlite");

        write_dump(&data_dir, "README.txt", "# Not a dump\nirrelevant");
        write_dump(&data_dir, "notes.md", "# Markdown\nignored too");

        let embedder = MockEmbedder::new(64);
        let options = IngestOptions {
            data_dir,
            chunk_size: 100,
            chunk_overlap: 0,
            reset: false,
        };

        let stats = ingest(&index_path, &embedder, &options).await.unwrap();
        assert_eq!(stats.sources_count, 0);
        assert_eq!(stats.chunks_count, 0);
    }

    #[tokio::test]
    async fn test_ingest_reset_clears_previous() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        let index_path = temp.path().join("index.sqlite");

        write_dump(
            &data_dir,
            "docs_llms.txt",
            "# One\nSome documentation content that is long enough to chunk.",
        );

        let embedder = MockEmbedder::new(64);
        let mut options = IngestOptions {
            data_dir,
            chunk_size: 100,
            chunk_overlap: 0,
            reset: false,
        };

        ingest(&index_path, &embedder, &options).await.unwrap();
        options.reset = true;
        ingest(&index_path, &embedder, &options).await.unwrap();

        let corpus = stats(&index_path).unwrap();
        assert_eq!(corpus.sources_count, 1);
    }

    #[test]
    fn test_search_missing_index_is_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let hits = search_index(&temp.path().join("missing.sqlite"), &[1.0, 0.0], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_stats_missing_index_errors() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(stats(&temp.path().join("missing.sqlite")).is_err());
    }

    #[test]
    fn test_is_docs_dump() {
        assert!(is_docs_dump(Path::new("data/langgraph_llms_full.txt")));
        assert!(is_docs_dump(Path::new("langchain_llms.txt")));
        assert!(!is_docs_dump(Path::new("README.txt")));
        assert!(!is_docs_dump(Path::new("langgraph_llms.md")));
    }
}
