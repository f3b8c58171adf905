//! SQLite-backed vector index for corpus chunks.
//!
//! The index is written only by the out-of-band ingest process; query
//! serving treats it as read-only.

use crate::types::{CorpusChunk, CorpusSource, SearchHit};
use docpilot_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// Open (and initialize if needed) the SQLite index database.
pub fn open_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            indexed_at TEXT NOT NULL,
            size_bytes INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT,
            FOREIGN KEY (source_id) REFERENCES sources(id)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Opened SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Insert a source into the index.
pub fn insert_source(conn: &Connection, source: &CorpusSource) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sources (id, name, path, indexed_at, size_bytes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            source.id,
            source.name,
            source.path.to_string_lossy().to_string(),
            source.indexed_at.to_rfc3339(),
            source.size_bytes as i64,
        ],
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to insert source: {}", e)))?;

    Ok(())
}

/// Insert a chunk with its embedding into the index.
pub fn insert_chunk(conn: &Connection, chunk: &CorpusChunk) -> AppResult<()> {
    let embedding_bytes = embedding_to_bytes(
        chunk
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Knowledge("Chunk missing embedding".to_string()))?,
    );

    let metadata_json = serde_json::to_string(&chunk.metadata)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize metadata: {}", e)))?;

    conn.execute(
        "INSERT OR REPLACE INTO chunks (id, source_id, position, text, embedding, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            chunk.id,
            chunk.source_id,
            chunk.position as i64,
            chunk.text,
            embedding_bytes,
            metadata_json,
        ],
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;

    Ok(())
}

/// Query the index for the top-k chunks most similar to the query embedding.
///
/// Returns hits ordered by descending cosine similarity. An empty index
/// yields an empty vector, not an error.
pub fn search(conn: &Connection, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>> {
    let mut stmt = conn
        .prepare("SELECT text, embedding, metadata FROM chunks")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let text: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            let metadata_json: Option<String> = row.get(2)?;
            Ok((text, embedding_bytes, metadata_json))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

    let mut hits: Vec<SearchHit> = Vec::new();

    for row in rows {
        let (text, embedding_bytes, metadata_json) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk row: {}", e)))?;

        let embedding = bytes_to_embedding(&embedding_bytes)?;
        let score = cosine_similarity(query_embedding, &embedding);

        let source = metadata_json
            .as_deref()
            .and_then(|m| serde_json::from_str::<serde_json::Value>(m).ok())
            .and_then(|v| describe_source(&v))
            .unwrap_or_else(|| "unknown".to_string());

        hits.push(SearchHit {
            text,
            source,
            score,
        });
    }

    // Descending by similarity.
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(top_k);

    tracing::debug!("Retrieved {} hits (requested top-{})", hits.len(), top_k);

    Ok(hits)
}

/// Build a human-readable source label from chunk metadata.
fn describe_source(metadata: &serde_json::Value) -> Option<String> {
    let source = metadata.get("source")?.as_str()?;
    match metadata.get("section").and_then(|s| s.as_str()) {
        Some(section) if !section.is_empty() => Some(format!("{} § {}", source, section)),
        _ => Some(source.to_string()),
    }
}

/// Get statistics for the index.
pub fn get_stats(conn: &Connection) -> AppResult<(u32, u32)> {
    let sources_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM sources", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count sources: {}", e)))?;

    let chunks_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM chunks", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))?;

    Ok((sources_count, chunks_count))
}

/// Reset the index (delete all data).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM chunks", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete chunks: {}", e)))?;

    conn.execute("DELETE FROM sources", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete sources: {}", e)))?;

    tracing::info!("Reset corpus index");
    Ok(())
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_source() -> CorpusSource {
        CorpusSource {
            id: "source1".to_string(),
            name: "langgraph".to_string(),
            path: PathBuf::from("data/langgraph_llms.txt"),
            indexed_at: Utc::now(),
            size_bytes: 100,
        }
    }

    fn test_chunk(id: &str, embedding: Vec<f32>) -> CorpusChunk {
        CorpusChunk {
            id: id.to_string(),
            source_id: "source1".to_string(),
            position: 0,
            text: format!("text for {}", id),
            embedding: Some(embedding),
            metadata: serde_json::json!({ "source": "langgraph", "section": "Checkpointers" }),
        }
    }

    #[test]
    fn test_open_index_creates_tables() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_index(temp_file.path()).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!(table_count >= 2);
    }

    #[test]
    fn test_insert_and_search() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_index(temp_file.path()).unwrap();

        insert_source(&conn, &test_source()).unwrap();
        insert_chunk(&conn, &test_chunk("chunk1", vec![1.0, 0.0, 0.0])).unwrap();
        insert_chunk(&conn, &test_chunk("chunk2", vec![0.0, 1.0, 0.0])).unwrap();

        let hits = search(&conn, &[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].text.contains("chunk1"));
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[0].source, "langgraph § Checkpointers");
    }

    #[test]
    fn test_search_empty_index() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_index(temp_file.path()).unwrap();

        let hits = search(&conn, &[1.0, 0.0, 0.0], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_respects_top_k() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_index(temp_file.path()).unwrap();

        insert_source(&conn, &test_source()).unwrap();
        for i in 0..10 {
            let mut chunk = test_chunk(&format!("chunk{}", i), vec![1.0, i as f32 * 0.1, 0.0]);
            chunk.position = i;
            insert_chunk(&conn, &chunk).unwrap();
        }

        let hits = search(&conn, &[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_reset_index() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_index(temp_file.path()).unwrap();

        insert_source(&conn, &test_source()).unwrap();
        insert_chunk(&conn, &test_chunk("chunk1", vec![1.0, 0.0])).unwrap();

        reset_index(&conn).unwrap();
        let (sources, chunks) = get_stats(&conn).unwrap();
        assert_eq!(sources, 0);
        assert_eq!(chunks, 0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_embedding_roundtrip() {
        let embedding = vec![0.5, -0.25, 3.75];
        let bytes = embedding_to_bytes(&embedding);
        let restored = bytes_to_embedding(&bytes).unwrap();
        assert_eq!(embedding, restored);
    }
}
