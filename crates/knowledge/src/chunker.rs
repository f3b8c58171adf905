//! Text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;

/// Chunk text into overlapping segments.
///
/// Character-based windows; boundaries are adjusted to valid UTF-8
/// positions. Chunks smaller than 10% of the window are dropped as noise.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    metadata: &serde_json::Value,
) -> Vec<ChunkCandidate> {
    if text.is_empty() {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }

        let chunk_text = &text[start..end];

        if chunk_text.len() < chunk_size / 10 {
            break;
        }

        let mut chunk_metadata = metadata.clone();
        if let Some(map) = chunk_metadata.as_object_mut() {
            map.insert("start".to_string(), serde_json::json!(start));
            map.insert("end".to_string(), serde_json::json!(end));
        }

        chunks.push(ChunkCandidate {
            position,
            text: chunk_text.trim().to_string(),
            metadata: chunk_metadata,
        });

        position += 1;

        let step = if chunk_size > overlap {
            chunk_size - overlap
        } else {
            chunk_size
        };

        let mut next_start = start + step;
        while next_start < text.len() && !text.is_char_boundary(next_start) {
            next_start += 1;
        }
        start = next_start;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
